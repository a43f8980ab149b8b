//! Source spans.
//!
//! Offsets are byte offsets into the source text; a span is half-open. Nodes
//! without a source extent (synthetic nodes, empty modifier lists) have no span
//! at all rather than a sentinel range.

use std::ops::Range;

/// A half-open byte range in source text.
pub type Span = Range<usize>;

/// A value with an associated source span.
///
/// The parser uses this for names and tokens that are not tree nodes of their
/// own but whose location still matters (a declaration's identifier, an
/// operator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Maps the inner value while preserving the span.
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }

    pub fn into_inner(self) -> T {
        self.node
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl<T> AsRef<T> for Spanned<T> {
    fn as_ref(&self) -> &T {
        &self.node
    }
}

/// True if `inner` lies within `outer` (an empty `inner` may sit on either edge).
pub fn contains(outer: &Span, inner: &Span) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Smallest span covering both inputs.
pub fn cover(a: &Span, b: &Span) -> Span {
    a.start.min(b.start)..a.end.max(b.end)
}
