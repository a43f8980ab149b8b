//! Syntax tree visitor infrastructure.
//!
//! Traversal is pre-order and in source order. Overriding a `visit_*` method
//! and calling the matching `walk_*` function keeps the descent going; returning
//! `ControlFlow::Break` stops the whole walk.

use std::ops::ControlFlow;

use crate::ast::tree::{ClassDecl, MethodDecl, Tree, TreeKind};

macro_rules! try_visit {
    ($expr:expr) => {
        match $expr {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(b) => return ControlFlow::Break(b),
        }
    };
}

/// Shared type alias for visitor traversal methods.
pub type VisitResult<B> = ControlFlow<B>;

/// Immutable tree visitor.
pub trait TreeVisitor {
    /// Early-exit payload produced when traversal stops.
    type Break;

    fn visit_tree(&mut self, tree: &Tree) -> VisitResult<Self::Break> {
        walk_tree(self, tree)
    }

    fn visit_class_decl(&mut self, tree: &Tree, _class: &ClassDecl) -> VisitResult<Self::Break> {
        walk_children(self, tree)
    }

    fn visit_method_decl(&mut self, tree: &Tree, _method: &MethodDecl) -> VisitResult<Self::Break> {
        walk_children(self, tree)
    }

    fn visit_variable_decl(&mut self, tree: &Tree) -> VisitResult<Self::Break> {
        walk_children(self, tree)
    }

    fn visit_erroneous(&mut self, tree: &Tree, _children: &[Tree]) -> VisitResult<Self::Break> {
        walk_children(self, tree)
    }
}

/// Dispatches `tree` to the visitor hook for its kind.
pub fn walk_tree<V: TreeVisitor + ?Sized>(visitor: &mut V, tree: &Tree) -> VisitResult<V::Break> {
    match &tree.kind {
        TreeKind::ClassDecl(class) => visitor.visit_class_decl(tree, class),
        TreeKind::MethodDecl(method) => visitor.visit_method_decl(tree, method),
        TreeKind::VariableDecl { .. } => visitor.visit_variable_decl(tree),
        TreeKind::Erroneous { children } => visitor.visit_erroneous(tree, children),
        _ => walk_children(visitor, tree),
    }
}

/// Visits each direct child of `tree`.
pub fn walk_children<V: TreeVisitor + ?Sized>(
    visitor: &mut V,
    tree: &Tree,
) -> VisitResult<V::Break> {
    for child in tree.children() {
        try_visit!(visitor.visit_tree(child));
    }
    ControlFlow::Continue(())
}
