//! Generic node collection visitor.

use crate::ast::tree::Tree;
use crate::ast::visitor::{TreeVisitor, VisitResult, walk_children};

/// Visitor that collects values produced by a node-matching closure.
#[derive(Debug)]
pub struct CollectingVisitor<T, F> {
    matcher: F,
    items: Vec<T>,
}

impl<T, F> CollectingVisitor<T, F>
where
    F: FnMut(&Tree) -> Option<T>,
{
    pub fn new(matcher: F) -> Self {
        Self {
            matcher,
            items: Vec::new(),
        }
    }

    /// Runs the matcher over every node of `tree`.
    pub fn collect(tree: &Tree, matcher: F) -> Vec<T> {
        let mut visitor = Self::new(matcher);
        let _ = visitor.visit_tree(tree);
        visitor.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T, F> TreeVisitor for CollectingVisitor<T, F>
where
    F: FnMut(&Tree) -> Option<T>,
{
    type Break = ();

    fn visit_tree(&mut self, tree: &Tree) -> VisitResult<()> {
        if let Some(item) = (self.matcher)(tree) {
            self.items.push(item);
        }
        walk_children(self, tree)
    }
}

/// All [`Erroneous`](crate::ast::TreeKind::Erroneous) nodes in pre-order.
pub fn erroneous_nodes(tree: &Tree) -> Vec<&Tree> {
    let mut found = Vec::new();
    collect_erroneous(tree, &mut found);
    found
}

fn collect_erroneous<'t>(tree: &'t Tree, found: &mut Vec<&'t Tree>) {
    if tree.is_erroneous() {
        found.push(tree);
    }
    for child in tree.children() {
        collect_erroneous(child, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_source;

    #[test]
    fn collects_names_of_matching_nodes() {
        let result = parse_source("class A { int x; int y; }");
        let names = CollectingVisitor::collect(&result.unit, |tree| {
            (tree.tag() == "VariableDecl").then(|| tree.name().unwrap_or_default().to_string())
        });
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn finds_erroneous_nodes() {
        let result = parse_source("class A { void f() { else ; } }");
        assert_eq!(erroneous_nodes(&result.unit).len(), 1);
    }
}
