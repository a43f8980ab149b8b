//! Span collection and containment checking.

use std::ops::ControlFlow;

use crate::ast::positions::PositionTable;
use crate::ast::span::{Span, contains};
use crate::ast::tree::Tree;
use crate::ast::visitor::{TreeVisitor, VisitResult, walk_children};

/// Collects the span of every node that has one, in pre-order.
#[derive(Debug)]
pub struct SpanCollector<'a> {
    positions: &'a PositionTable,
    spans: Vec<(&'static str, Span)>,
}

impl<'a> SpanCollector<'a> {
    pub fn new(positions: &'a PositionTable) -> Self {
        Self {
            positions,
            spans: Vec::new(),
        }
    }

    /// Collects spans from a whole tree, tagged with node kind.
    pub fn collect(tree: &Tree, positions: &'a PositionTable) -> Vec<(&'static str, Span)> {
        let mut collector = Self::new(positions);
        let _ = collector.visit_tree(tree);
        collector.spans
    }

    pub fn spans(&self) -> &[(&'static str, Span)] {
        &self.spans
    }
}

impl TreeVisitor for SpanCollector<'_> {
    type Break = ();

    fn visit_tree(&mut self, tree: &Tree) -> VisitResult<()> {
        if let Some(span) = self.positions.span_of(tree) {
            self.spans.push((tree.tag(), span));
        }
        walk_children(self, tree)
    }
}

/// A child whose span escapes its nearest spanned ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainmentViolation {
    pub parent: &'static str,
    pub parent_span: Span,
    pub child: &'static str,
    pub child_span: Span,
}

/// Finds the first node whose span is not inside its nearest spanned ancestor.
///
/// Nodes without a span are skipped over; their children are checked against
/// the closest ancestor that has one.
#[derive(Debug)]
pub struct ContainmentChecker<'a> {
    positions: &'a PositionTable,
    ancestors: Vec<(&'static str, Span)>,
}

impl<'a> ContainmentChecker<'a> {
    pub fn new(positions: &'a PositionTable) -> Self {
        Self {
            positions,
            ancestors: Vec::new(),
        }
    }

    pub fn check(tree: &Tree, positions: &'a PositionTable) -> Option<ContainmentViolation> {
        match Self::new(positions).visit_tree(tree) {
            ControlFlow::Break(violation) => Some(violation),
            ControlFlow::Continue(()) => None,
        }
    }
}

impl TreeVisitor for ContainmentChecker<'_> {
    type Break = ContainmentViolation;

    fn visit_tree(&mut self, tree: &Tree) -> VisitResult<ContainmentViolation> {
        let Some(span) = self.positions.span_of(tree) else {
            return walk_children(self, tree);
        };
        if let Some((parent, parent_span)) = self.ancestors.last() {
            if !contains(parent_span, &span) {
                return ControlFlow::Break(ContainmentViolation {
                    parent,
                    parent_span: parent_span.clone(),
                    child: tree.tag(),
                    child_span: span,
                });
            }
        }
        self.ancestors.push((tree.tag(), span));
        let flow = walk_children(self, tree);
        self.ancestors.pop();
        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_source;

    #[test]
    fn well_formed_input_has_contained_spans() {
        let result = parse_source("class A { int f(int x) { return x + 1; } }");
        assert_eq!(ContainmentChecker::check(&result.unit, &result.positions), None);
    }

    #[test]
    fn collector_sees_identifiers() {
        let result = parse_source("class A { int x = y; }");
        let spans = SpanCollector::collect(&result.unit, &result.positions);
        assert!(spans.iter().any(|(tag, span)| *tag == "Identifier" && *span == (18..19)));
    }
}
