//! Syntax tree, position table, and visitors.

pub mod positions;
mod span;
pub mod tree;
pub mod visitor;
pub mod visitors;

pub use positions::{PositionError, PositionTable, clean_doc_comment};
pub use span::{Span, Spanned, contains, cover};
pub use tree::{
    BinaryOp, CaseKind, ClassDecl, ClassKind, ERROR_NAME, LambdaParams, LiteralKind, MethodDecl,
    Modifier, Name, NodeId, PrimitiveKind, ReferenceMode, Tree, TreeKind, UnaryOp, VarKind,
    WildcardBound,
};
pub use visitor::{TreeVisitor, VisitResult, walk_children, walk_tree};
