//! Side table of node positions and doc comments.
//!
//! Every node produced by a parse owns one entry, addressed by its
//! [`NodeId`]. A table only answers for nodes of its own parse; a node from
//! another parse is a [`PositionError::ForeignNode`].

use crate::ast::span::Span;
use crate::ast::tree::{NodeId, Tree};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

static NEXT_UNIT: AtomicU32 = AtomicU32::new(1);

/// Allocates a fresh parse identity.
pub(crate) fn next_unit() -> u32 {
    NEXT_UNIT.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("node belongs to parse #{node_unit}, table describes parse #{table_unit}")]
    ForeignNode { node_unit: u32, table_unit: u32 },
    #[error("node index {index} is outside the table ({len} entries)")]
    UnknownNode { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    span: Option<Span>,
    preferred: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    unit: u32,
    entries: Vec<Entry>,
    docs: HashMap<u32, SmolStr>,
}

impl PositionTable {
    pub(crate) fn new(unit: u32) -> Self {
        Self {
            unit,
            entries: Vec::new(),
            docs: HashMap::new(),
        }
    }

    /// Empties the table and binds it to another parse.
    pub(crate) fn reset(&mut self, unit: u32) {
        self.unit = unit;
        self.entries.clear();
        self.docs.clear();
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn alloc(&mut self, span: Option<Span>, preferred: Option<usize>) -> NodeId {
        let index = self.entries.len() as u32;
        self.entries.push(Entry { span, preferred });
        NodeId::new(self.unit, index)
    }

    pub(crate) fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.span = Some(span);
        }
    }

    /// Drops every entry allocated after the first `len`, for abandoned speculation.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        self.docs.retain(|index, _| (*index as usize) < len);
    }

    pub(crate) fn attach_doc(&mut self, id: NodeId, text: SmolStr) {
        if id.unit == self.unit {
            self.docs.insert(id.index, text);
        }
    }

    fn entry(&self, id: NodeId) -> Result<&Entry, PositionError> {
        if id.unit != self.unit {
            return Err(PositionError::ForeignNode {
                node_unit: id.unit,
                table_unit: self.unit,
            });
        }
        self.entries
            .get(id.index())
            .ok_or(PositionError::UnknownNode {
                index: id.index(),
                len: self.entries.len(),
            })
    }

    pub fn try_span_of(&self, id: NodeId) -> Result<Option<Span>, PositionError> {
        Ok(self.entry(id)?.span.clone())
    }

    pub fn try_start_of(&self, id: NodeId) -> Result<Option<usize>, PositionError> {
        Ok(self.entry(id)?.span.as_ref().map(|span| span.start))
    }

    pub fn try_end_of(&self, id: NodeId) -> Result<Option<usize>, PositionError> {
        Ok(self.entry(id)?.span.as_ref().map(|span| span.end))
    }

    pub fn try_preferred_of(&self, id: NodeId) -> Result<Option<usize>, PositionError> {
        let entry = self.entry(id)?;
        Ok(entry
            .preferred
            .or_else(|| entry.span.as_ref().map(|span| span.start)))
    }

    /// Span of `node`, `None` when it has no source extent.
    ///
    /// # Panics
    ///
    /// Panics if `node` was produced by a different parse.
    pub fn span_of(&self, node: &Tree) -> Option<Span> {
        expect_own(self.try_span_of(node.id))
    }

    /// Offset of the first character of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was produced by a different parse.
    pub fn start_of(&self, node: &Tree) -> Option<usize> {
        expect_own(self.try_start_of(node.id))
    }

    /// Offset just past the last character of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was produced by a different parse.
    pub fn end_of(&self, node: &Tree) -> Option<usize> {
        expect_own(self.try_end_of(node.id))
    }

    /// The offset diagnostics about `node` should point at: the operator of a
    /// binary expression, the name of a declaration, and so on.
    ///
    /// # Panics
    ///
    /// Panics if `node` was produced by a different parse.
    pub fn preferred_of(&self, node: &Tree) -> Option<usize> {
        expect_own(self.try_preferred_of(node.id))
    }

    /// Cleaned text of the doc comment attached to `node`.
    pub fn doc_comment_of(&self, node: &Tree) -> Option<&str> {
        if node.id.unit != self.unit {
            return None;
        }
        self.docs.get(&node.id.index).map(SmolStr::as_str)
    }
}

fn expect_own<T>(result: Result<T, PositionError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("position lookup failed: {err}"),
    }
}

/// Strips comment delimiters and leading `*` decoration from a raw `/** ... */`.
pub fn clean_doc_comment(raw: &str) -> SmolStr {
    let body = raw.strip_prefix("/**").unwrap_or(raw);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let mut lines: Vec<&str> = body
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let line = line.trim_start();
            let line = if index == 0 {
                line
            } else {
                line.trim_start_matches('*')
            };
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();

    while lines.first().is_some_and(|line| line.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    SmolStr::new(lines.join("\n"))
}
