//! Syntax tree node kinds.
//!
//! The tree is a closed sum type: every node is a [`Tree`] carrying its
//! [`NodeId`] and a [`TreeKind`]. Positions live in the
//! [`PositionTable`](crate::ast::PositionTable) produced by the same parse and
//! are looked up through the id.

use crate::lexer::token::TokenKind;
use smol_str::SmolStr;
use std::fmt::{self, Write as _};

/// Identifier text.
pub type Name = SmolStr;

/// Name given to declarations and selects whose identifier is missing.
pub const ERROR_NAME: &str = "<error>";

/// Identity of a node within one parse.
///
/// `unit` distinguishes parses, `index` addresses the position table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) unit: u32,
    pub(crate) index: u32,
}

impl NodeId {
    pub(crate) fn new(unit: u32, index: u32) -> Self {
        Self { unit, index }
    }

    /// The parse this node belongs to.
    pub fn unit(self) -> u32 {
        self.unit
    }

    /// Position of the node in its table.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub id: NodeId,
    pub kind: TreeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
            ClassKind::Annotation => "@interface",
        }
    }
}

/// What a [`TreeKind::VariableDecl`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Field,
    Local,
    Parameter,
    LambdaParameter,
    EnumConstant,
    RecordComponent,
    Resource,
    Binding,
    CatchParameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Public => Modifier::Public,
            TokenKind::Protected => Modifier::Protected,
            TokenKind::Private => Modifier::Private,
            TokenKind::Static => Modifier::Static,
            TokenKind::Abstract => Modifier::Abstract,
            TokenKind::Final => Modifier::Final,
            TokenKind::Native => Modifier::Native,
            TokenKind::Synchronized => Modifier::Synchronized,
            TokenKind::Transient => Modifier::Transient,
            TokenKind::Volatile => Modifier::Volatile,
            TokenKind::Strictfp => Modifier::Strictfp,
            TokenKind::Default => Modifier::Default,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }
}

/// Binary operators, also used for the operator part of compound assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding strength; higher binds tighter. `instanceof` shares the
    /// relational level.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Complement,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "~",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

impl LiteralKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::IntLiteral => LiteralKind::Int,
            TokenKind::LongLiteral => LiteralKind::Long,
            TokenKind::FloatLiteral => LiteralKind::Float,
            TokenKind::DoubleLiteral => LiteralKind::Double,
            TokenKind::CharLiteral => LiteralKind::Char,
            TokenKind::StringLiteral => LiteralKind::String,
            TokenKind::True | TokenKind::False => LiteralKind::Boolean,
            TokenKind::Null => LiteralKind::Null,
            _ => return None,
        })
    }
}

/// Primitive types, plus `void` where the grammar admits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Boolean => PrimitiveKind::Boolean,
            TokenKind::Byte => PrimitiveKind::Byte,
            TokenKind::Char => PrimitiveKind::Char,
            TokenKind::Short => PrimitiveKind::Short,
            TokenKind::Int => PrimitiveKind::Int,
            TokenKind::Long => PrimitiveKind::Long,
            TokenKind::Float => PrimitiveKind::Float,
            TokenKind::Double => PrimitiveKind::Double,
            TokenKind::Void => PrimitiveKind::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbound,
    Extends,
    Super,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseKind {
    /// `case X:` followed by a statement group.
    Statement,
    /// `case X -> body`.
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceMode {
    Invoke,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaParams {
    Implicit,
    Explicit,
}

/// Class, interface, enum, record, or annotation type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub modifiers: Box<Tree>,
    pub kind: ClassKind,
    /// Empty for anonymous class bodies.
    pub name: Name,
    pub type_params: Vec<Tree>,
    pub extends: Option<Box<Tree>>,
    /// `implements` clause, or the `extends` list of an interface.
    pub implements: Vec<Tree>,
    pub permits: Vec<Tree>,
    pub record_components: Vec<Tree>,
    pub members: Vec<Tree>,
}

/// Method or constructor declaration. Constructors have no `result`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Box<Tree>,
    pub type_params: Vec<Tree>,
    pub result: Option<Box<Tree>>,
    pub name: Name,
    pub params: Vec<Tree>,
    pub thrown: Vec<Tree>,
    /// `None` when the declaration has no body (abstract, or a missing `{`).
    pub body: Option<Box<Tree>>,
    pub default_value: Option<Box<Tree>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeKind {
    CompilationUnit {
        package: Option<Box<Tree>>,
        imports: Vec<Tree>,
        decls: Vec<Tree>,
    },
    PackageDecl {
        annotations: Vec<Tree>,
        name: Box<Tree>,
    },
    Import {
        is_static: bool,
        /// Qualified name; on-demand imports end with a `*` select.
        name: Box<Tree>,
    },
    ClassDecl(Box<ClassDecl>),
    MethodDecl(Box<MethodDecl>),
    VariableDecl {
        modifiers: Box<Tree>,
        /// `None` for implicitly typed lambda parameters and enum constants.
        var_type: Option<Box<Tree>>,
        name: Name,
        init: Option<Box<Tree>>,
        kind: VarKind,
    },
    Modifiers {
        flags: Vec<Modifier>,
        annotations: Vec<Tree>,
    },
    Annotation {
        annotation_type: Box<Tree>,
        args: Vec<Tree>,
    },
    TypeParameter {
        name: Name,
        bounds: Vec<Tree>,
    },
    Block {
        is_static: bool,
        stats: Vec<Tree>,
    },
    EmptyStatement,
    ExpressionStatement {
        expr: Box<Tree>,
    },
    If {
        cond: Box<Tree>,
        then_stmt: Box<Tree>,
        else_stmt: Option<Box<Tree>>,
    },
    While {
        cond: Box<Tree>,
        body: Box<Tree>,
    },
    DoWhile {
        body: Box<Tree>,
        cond: Box<Tree>,
    },
    For {
        init: Vec<Tree>,
        cond: Option<Box<Tree>>,
        update: Vec<Tree>,
        body: Box<Tree>,
    },
    ForEach {
        var: Box<Tree>,
        expr: Box<Tree>,
        body: Box<Tree>,
    },
    Labeled {
        label: Name,
        body: Box<Tree>,
    },
    Switch {
        selector: Box<Tree>,
        cases: Vec<Tree>,
    },
    SwitchExpression {
        selector: Box<Tree>,
        cases: Vec<Tree>,
    },
    Case {
        labels: Vec<Tree>,
        guard: Option<Box<Tree>>,
        kind: CaseKind,
        /// Statement group of a `case X:`.
        stats: Vec<Tree>,
        /// Body of a `case X ->` rule.
        body: Option<Box<Tree>>,
    },
    ConstantCaseLabel {
        expr: Box<Tree>,
    },
    PatternCaseLabel {
        pattern: Box<Tree>,
    },
    DefaultCaseLabel,
    BindingPattern {
        var: Box<Tree>,
    },
    Yield {
        value: Box<Tree>,
    },
    Synchronized {
        lock: Box<Tree>,
        body: Box<Tree>,
    },
    Try {
        resources: Vec<Tree>,
        body: Box<Tree>,
        catches: Vec<Tree>,
        finalizer: Option<Box<Tree>>,
    },
    Catch {
        param: Box<Tree>,
        body: Box<Tree>,
    },
    Throw {
        expr: Box<Tree>,
    },
    Return {
        expr: Option<Box<Tree>>,
    },
    Break {
        label: Option<Name>,
    },
    Continue {
        label: Option<Name>,
    },
    Assert {
        cond: Box<Tree>,
        detail: Option<Box<Tree>>,
    },
    Assignment {
        lhs: Box<Tree>,
        rhs: Box<Tree>,
    },
    CompoundAssignment {
        op: BinaryOp,
        lhs: Box<Tree>,
        rhs: Box<Tree>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Tree>,
        rhs: Box<Tree>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Tree>,
    },
    Conditional {
        cond: Box<Tree>,
        then_expr: Box<Tree>,
        else_expr: Box<Tree>,
    },
    InstanceOf {
        expr: Box<Tree>,
        /// A type or a [`TreeKind::BindingPattern`].
        pattern: Box<Tree>,
    },
    TypeCast {
        target: Box<Tree>,
        expr: Box<Tree>,
    },
    Parens {
        expr: Box<Tree>,
    },
    MethodInvocation {
        type_args: Vec<Tree>,
        method: Box<Tree>,
        args: Vec<Tree>,
    },
    NewClass {
        enclosing: Option<Box<Tree>>,
        type_args: Vec<Tree>,
        class: Box<Tree>,
        args: Vec<Tree>,
        /// Anonymous class body, a nameless [`ClassDecl`].
        body: Option<Box<Tree>>,
    },
    NewArray {
        /// Element type once all dimensions are applied; `None` for a bare `{...}`.
        elem_type: Option<Box<Tree>>,
        dims: Vec<Tree>,
        init: Option<Vec<Tree>>,
    },
    Lambda {
        params: Vec<Tree>,
        param_kind: LambdaParams,
        body: Box<Tree>,
    },
    MemberReference {
        expr: Box<Tree>,
        mode: ReferenceMode,
        name: Name,
    },
    MemberSelect {
        expr: Box<Tree>,
        name: Name,
    },
    Identifier {
        name: Name,
    },
    Literal {
        kind: LiteralKind,
        text: SmolStr,
    },
    ArrayAccess {
        expr: Box<Tree>,
        index: Box<Tree>,
    },
    PrimitiveType {
        kind: PrimitiveKind,
    },
    ArrayType {
        elem: Box<Tree>,
        varargs: bool,
    },
    ParameterizedType {
        base: Box<Tree>,
        args: Vec<Tree>,
    },
    Wildcard {
        bound: WildcardBound,
        inner: Option<Box<Tree>>,
    },
    IntersectionType {
        bounds: Vec<Tree>,
    },
    UnionType {
        alternatives: Vec<Tree>,
    },
    /// A rule that could not be completed; holds whatever was salvaged.
    Erroneous {
        children: Vec<Tree>,
    },
    /// A token consumed by recovery, kept so no input is lost.
    Skipped {
        token: TokenKind,
        text: SmolStr,
    },
}

impl Tree {
    pub fn new(id: NodeId, kind: TreeKind) -> Self {
        Self { id, kind }
    }

    /// Name of the node kind.
    pub fn tag(&self) -> &'static str {
        use TreeKind::*;
        match &self.kind {
            CompilationUnit { .. } => "CompilationUnit",
            PackageDecl { .. } => "PackageDecl",
            Import { .. } => "Import",
            ClassDecl(_) => "ClassDecl",
            MethodDecl(_) => "MethodDecl",
            VariableDecl { .. } => "VariableDecl",
            Modifiers { .. } => "Modifiers",
            Annotation { .. } => "Annotation",
            TypeParameter { .. } => "TypeParameter",
            Block { .. } => "Block",
            EmptyStatement => "EmptyStatement",
            ExpressionStatement { .. } => "ExpressionStatement",
            If { .. } => "If",
            While { .. } => "While",
            DoWhile { .. } => "DoWhile",
            For { .. } => "For",
            ForEach { .. } => "ForEach",
            Labeled { .. } => "Labeled",
            Switch { .. } => "Switch",
            SwitchExpression { .. } => "SwitchExpression",
            Case { .. } => "Case",
            ConstantCaseLabel { .. } => "ConstantCaseLabel",
            PatternCaseLabel { .. } => "PatternCaseLabel",
            DefaultCaseLabel => "DefaultCaseLabel",
            BindingPattern { .. } => "BindingPattern",
            Yield { .. } => "Yield",
            Synchronized { .. } => "Synchronized",
            Try { .. } => "Try",
            Catch { .. } => "Catch",
            Throw { .. } => "Throw",
            Return { .. } => "Return",
            Break { .. } => "Break",
            Continue { .. } => "Continue",
            Assert { .. } => "Assert",
            Assignment { .. } => "Assignment",
            CompoundAssignment { .. } => "CompoundAssignment",
            Binary { .. } => "Binary",
            Unary { .. } => "Unary",
            Conditional { .. } => "Conditional",
            InstanceOf { .. } => "InstanceOf",
            TypeCast { .. } => "TypeCast",
            Parens { .. } => "Parens",
            MethodInvocation { .. } => "MethodInvocation",
            NewClass { .. } => "NewClass",
            NewArray { .. } => "NewArray",
            Lambda { .. } => "Lambda",
            MemberReference { .. } => "MemberReference",
            MemberSelect { .. } => "MemberSelect",
            Identifier { .. } => "Identifier",
            Literal { .. } => "Literal",
            ArrayAccess { .. } => "ArrayAccess",
            PrimitiveType { .. } => "PrimitiveType",
            ArrayType { .. } => "ArrayType",
            ParameterizedType { .. } => "ParameterizedType",
            Wildcard { .. } => "Wildcard",
            IntersectionType { .. } => "IntersectionType",
            UnionType { .. } => "UnionType",
            Erroneous { .. } => "Erroneous",
            Skipped { .. } => "Skipped",
        }
    }

    /// The declared or referenced name, for nodes that have one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TreeKind::ClassDecl(class) => Some(&class.name),
            TreeKind::MethodDecl(method) => Some(&method.name),
            TreeKind::VariableDecl { name, .. }
            | TreeKind::TypeParameter { name, .. }
            | TreeKind::MemberSelect { name, .. }
            | TreeKind::MemberReference { name, .. }
            | TreeKind::Identifier { name } => Some(name),
            TreeKind::Labeled { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn is_erroneous(&self) -> bool {
        matches!(self.kind, TreeKind::Erroneous { .. })
    }

    /// True if this node or any descendant is [`TreeKind::Erroneous`].
    pub fn contains_errors(&self) -> bool {
        self.is_erroneous() || self.children().into_iter().any(Tree::contains_errors)
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Tree> {
        use TreeKind::*;
        let mut out: Vec<&Tree> = Vec::new();
        match &self.kind {
            CompilationUnit {
                package,
                imports,
                decls,
            } => {
                out.extend(package.as_deref());
                out.extend(imports);
                out.extend(decls);
            }
            PackageDecl { annotations, name } => {
                out.extend(annotations);
                out.push(name);
            }
            Import { name, .. } => out.push(name),
            ClassDecl(class) => {
                out.push(&class.modifiers);
                out.extend(&class.type_params);
                out.extend(&class.record_components);
                out.extend(class.extends.as_deref());
                out.extend(&class.implements);
                out.extend(&class.permits);
                out.extend(&class.members);
            }
            MethodDecl(method) => {
                out.push(&method.modifiers);
                out.extend(&method.type_params);
                out.extend(method.result.as_deref());
                out.extend(&method.params);
                out.extend(&method.thrown);
                out.extend(method.default_value.as_deref());
                out.extend(method.body.as_deref());
            }
            VariableDecl {
                modifiers,
                var_type,
                init,
                ..
            } => {
                out.push(modifiers);
                out.extend(var_type.as_deref());
                out.extend(init.as_deref());
            }
            Modifiers { annotations, .. } => out.extend(annotations),
            Annotation {
                annotation_type,
                args,
            } => {
                out.push(annotation_type);
                out.extend(args);
            }
            TypeParameter { bounds, .. } => out.extend(bounds),
            Block { stats, .. } => out.extend(stats),
            EmptyStatement | DefaultCaseLabel | Break { .. } | Continue { .. } => {}
            ExpressionStatement { expr } | Throw { expr } | Parens { expr } => out.push(expr),
            If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                out.push(cond);
                out.push(then_stmt);
                out.extend(else_stmt.as_deref());
            }
            While { cond, body } => {
                out.push(cond);
                out.push(body);
            }
            DoWhile { body, cond } => {
                out.push(body);
                out.push(cond);
            }
            For {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init);
                out.extend(cond.as_deref());
                out.extend(update);
                out.push(body);
            }
            ForEach { var, expr, body } => {
                out.push(var);
                out.push(expr);
                out.push(body);
            }
            Labeled { body, .. } => out.push(body),
            Switch { selector, cases } | SwitchExpression { selector, cases } => {
                out.push(selector);
                out.extend(cases);
            }
            Case {
                labels,
                guard,
                stats,
                body,
                ..
            } => {
                out.extend(labels);
                out.extend(guard.as_deref());
                out.extend(stats);
                out.extend(body.as_deref());
            }
            ConstantCaseLabel { expr } => out.push(expr),
            PatternCaseLabel { pattern } => out.push(pattern),
            BindingPattern { var } => out.push(var),
            Yield { value } => out.push(value),
            Synchronized { lock, body } => {
                out.push(lock);
                out.push(body);
            }
            Try {
                resources,
                body,
                catches,
                finalizer,
            } => {
                out.extend(resources);
                out.push(body);
                out.extend(catches);
                out.extend(finalizer.as_deref());
            }
            Catch { param, body } => {
                out.push(param);
                out.push(body);
            }
            Return { expr } => out.extend(expr.as_deref()),
            Assert { cond, detail } => {
                out.push(cond);
                out.extend(detail.as_deref());
            }
            Assignment { lhs, rhs }
            | CompoundAssignment { lhs, rhs, .. }
            | Binary { lhs, rhs, .. } => {
                out.push(lhs);
                out.push(rhs);
            }
            Unary { arg, .. } => out.push(arg),
            Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                out.push(cond);
                out.push(then_expr);
                out.push(else_expr);
            }
            InstanceOf { expr, pattern } => {
                out.push(expr);
                out.push(pattern);
            }
            TypeCast { target, expr } => {
                out.push(target);
                out.push(expr);
            }
            MethodInvocation {
                type_args,
                method,
                args,
            } => {
                out.push(method);
                out.extend(type_args);
                out.extend(args);
            }
            NewClass {
                enclosing,
                type_args,
                class,
                args,
                body,
            } => {
                out.extend(enclosing.as_deref());
                out.extend(type_args);
                out.push(class);
                out.extend(args);
                out.extend(body.as_deref());
            }
            NewArray {
                elem_type,
                dims,
                init,
            } => {
                out.extend(elem_type.as_deref());
                out.extend(dims);
                if let Some(init) = init {
                    out.extend(init);
                }
            }
            Lambda { params, body, .. } => {
                out.extend(params);
                out.push(body);
            }
            MemberReference { expr, .. } | MemberSelect { expr, .. } => out.push(expr),
            Identifier { .. } | Literal { .. } | PrimitiveType { .. } | Skipped { .. } => {}
            ArrayAccess { expr, index } => {
                out.push(expr);
                out.push(index);
            }
            ArrayType { elem, .. } => out.push(elem),
            ParameterizedType { base, args } => {
                out.push(base);
                out.extend(args);
            }
            Wildcard { inner, .. } => out.extend(inner.as_deref()),
            IntersectionType { bounds } => out.extend(bounds),
            UnionType { alternatives } => out.extend(alternatives),
            Erroneous { children } => out.extend(children),
        }
        out
    }

    /// Structural fingerprint: kinds, names, operators and literal text, with
    /// ids and positions left out. Two trees with equal shapes are the same
    /// syntax.
    pub fn shape(&self) -> String {
        let mut out = String::new();
        self.write_shape(&mut out);
        out
    }

    fn write_shape(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.tag());
        // Writing into a String cannot fail.
        let _ = self.write_attributes(out);
        for child in self.children() {
            out.push(' ');
            child.write_shape(out);
        }
        out.push(')');
    }

    fn write_attributes(&self, out: &mut String) -> fmt::Result {
        use TreeKind::*;
        match &self.kind {
            Import { is_static, .. } => write!(out, " static={is_static}"),
            ClassDecl(class) => write!(out, " {} {:?}", class.kind.keyword(), class.name.as_str()),
            MethodDecl(method) => write!(
                out,
                " {:?} body={}",
                method.name.as_str(),
                method.body.is_some()
            ),
            VariableDecl { name, kind, .. } => write!(out, " {:?} {kind:?}", name.as_str()),
            Modifiers { flags, .. } => {
                for flag in flags {
                    write!(out, " {}", flag.keyword())?;
                }
                Ok(())
            }
            TypeParameter { name, .. } => write!(out, " {:?}", name.as_str()),
            Block { is_static, .. } => write!(out, " static={is_static}"),
            Labeled { label, .. } => write!(out, " {:?}", label.as_str()),
            Case { kind, .. } => write!(out, " {kind:?}"),
            Break { label } | Continue { label } => write!(out, " {label:?}"),
            CompoundAssignment { op, .. } => write!(out, " {}=", op.symbol()),
            Binary { op, .. } => write!(out, " {}", op.symbol()),
            Unary { op, .. } => write!(out, " {op:?}"),
            NewArray { init, .. } => write!(out, " init={}", init.is_some()),
            Lambda { param_kind, .. } => write!(out, " {param_kind:?}"),
            MemberReference { mode, name, .. } => write!(out, " {mode:?} {:?}", name.as_str()),
            MemberSelect { name, .. } | Identifier { name } => write!(out, " {:?}", name.as_str()),
            Literal { text, .. } => write!(out, " {text}"),
            PrimitiveType { kind } => write!(out, " {}", kind.keyword()),
            ArrayType { varargs, .. } => write!(out, " varargs={varargs}"),
            Wildcard { bound, .. } => write!(out, " {bound:?}"),
            Skipped { text, .. } => write!(out, " {text:?}"),
            _ => Ok(()),
        }
    }
}
