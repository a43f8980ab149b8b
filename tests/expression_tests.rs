//! Expression Parsing Tests
//!
//! Operator precedence, primaries and selectors, creators, lambdas, and the
//! preferred positions expressions carry for diagnostics.

mod common;

use common::{members, parse_checked, top_level};
use javelin_syntax::ast::{BinaryOp, UnaryOp};
use javelin_syntax::{DiagnosticCode, ParseResult, Tree, TreeKind, parse_source};

const PREFIX: &str = "class T { Object f = ";

/// Parses `expr` as a field initializer; returns the result and the initializer.
fn parse_expr(expr: &str) -> (ParseResult, Tree) {
    let result = parse_source(&format!("{PREFIX}{expr}; }}"));
    let init = {
        let class = &top_level(&result)[0];
        match &members(class)[0].kind {
            TreeKind::VariableDecl {
                init: Some(init), ..
            } => init.as_ref().clone(),
            _ => panic!("no initializer in {}", class.shape()),
        }
    };
    (result, init)
}

fn shape_of(expr: &str) -> String {
    let (result, tree) = parse_expr(expr);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics for `{expr}`: {:?}",
        result.diagnostics
    );
    tree.shape()
}

#[test]
fn logical_and_prefers_its_operator() {
    let expr = "a != null && a instanceof String";
    let (result, tree) = parse_expr(expr);
    assert!(result.diagnostics.is_empty());
    assert!(matches!(tree.kind, TreeKind::Binary { op: BinaryOp::And, .. }));
    let and = PREFIX.len() + expr.find("&&").unwrap_or_default();
    assert_eq!(result.preferred_of(&tree), Some(and));
    assert_eq!(result.start_of(&tree), Some(PREFIX.len()));
    assert_eq!(result.end_of(&tree), Some(PREFIX.len() + expr.len()));
}

#[test]
fn precedence_ladder() {
    assert_eq!(
        shape_of("a || b && c | d ^ e & f"),
        "(Binary || (Identifier \"a\") (Binary && (Identifier \"b\") \
         (Binary | (Identifier \"c\") (Binary ^ (Identifier \"d\") \
         (Binary & (Identifier \"e\") (Identifier \"f\"))))))"
    );
    assert_eq!(
        shape_of("a == b < c + d * e"),
        "(Binary == (Identifier \"a\") (Binary < (Identifier \"b\") \
         (Binary + (Identifier \"c\") (Binary * (Identifier \"d\") (Identifier \"e\")))))"
    );
}

#[test]
fn binary_operators_are_left_associative() {
    assert_eq!(
        shape_of("a - b - c"),
        "(Binary - (Binary - (Identifier \"a\") (Identifier \"b\")) (Identifier \"c\"))"
    );
}

#[test]
fn assignment_and_conditional_are_right_associative() {
    assert_eq!(
        shape_of("a = b = c"),
        "(Assignment (Identifier \"a\") (Assignment (Identifier \"b\") (Identifier \"c\")))"
    );
    assert_eq!(
        shape_of("a ? b : c ? d : e"),
        "(Conditional (Identifier \"a\") (Identifier \"b\") \
         (Conditional (Identifier \"c\") (Identifier \"d\") (Identifier \"e\")))"
    );
}

#[test]
fn unary_operators() {
    let (_, tree) = parse_expr("-x++");
    let TreeKind::Unary { op, arg } = &tree.kind else {
        panic!("not unary: {}", tree.shape());
    };
    assert_eq!(*op, UnaryOp::Minus);
    assert!(matches!(
        arg.kind,
        TreeKind::Unary {
            op: UnaryOp::PostIncrement,
            ..
        }
    ));
    assert!(shape_of("!~a").starts_with("(Unary Not (Unary Complement"));
}

#[test]
fn instanceof_with_binding_pattern() {
    let shape = shape_of("o instanceof String s && s.isEmpty()");
    assert!(shape.starts_with("(Binary && (InstanceOf"), "{shape}");
    assert!(shape.contains("(BindingPattern"), "{shape}");
}

#[test]
fn instanceof_prefers_its_keyword() {
    let expr = "o instanceof String";
    let (result, tree) = parse_expr(expr);
    assert_eq!(result.preferred_of(&tree), Some(PREFIX.len() + 2));
}

#[test]
fn array_creation_and_initializers() {
    assert!(shape_of("new int[] {1, 2, 3}").starts_with("(NewArray init=true"));
    assert!(shape_of("new String[2][3]").starts_with("(NewArray init=false"));
    let (result, _) = parse_expr("new int[]");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::ArrayDimensionMissing);
}

#[test]
fn member_references() {
    assert!(shape_of("String::valueOf").starts_with("(MemberReference Invoke \"valueOf\""));
    assert!(shape_of("ArrayList::new").starts_with("(MemberReference New"));
    assert!(shape_of("int[]::clone").starts_with("(MemberReference Invoke \"clone\""));
}

#[test]
fn explicit_generic_invocation() {
    let shape = shape_of("Collections.<String>emptyList()");
    assert!(shape.starts_with("(MethodInvocation"), "{shape}");
}

#[test]
fn qualified_this_and_class_literals() {
    assert!(shape_of("Outer.this").starts_with("(MemberSelect \"this\""));
    assert!(shape_of("String.class").starts_with("(MemberSelect \"class\""));
}

#[test]
fn lambda_with_block_body() {
    let shape = shape_of("(x, y) -> { return x + y; }");
    assert!(shape.starts_with("(Lambda Implicit"), "{shape}");
    assert!(shape.contains("(Return"), "{shape}");
}

#[test]
fn switch_expression_as_operand() {
    let shape = shape_of("1 + switch (k) { case 1 -> 2; default -> 3; }");
    assert!(shape.starts_with("(Binary + (Literal 1) (SwitchExpression"), "{shape}");
}

#[test]
fn literals_keep_their_text() {
    assert_eq!(shape_of("0x1F"), "(Literal 0x1F)");
    assert_eq!(shape_of("1_000L"), "(Literal 1_000L)");
    assert_eq!(shape_of("'\\n'"), "(Literal '\\n')");
    assert_eq!(shape_of("\"hi\""), "(Literal \"hi\")");
}

#[test]
fn missing_operand() {
    let source = format!("{PREFIX}1 + ; }}");
    let result = parse_checked(&source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::IllegalStartOfExpr);
    assert_eq!(result.diagnostics[0].position, PREFIX.len() + 4);
}

#[test]
fn unclosed_parenthesis() {
    let source = format!("{PREFIX}(1 + 2; }}");
    let result = parse_checked(&source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::Expected);
    assert_eq!(diag.args, vec!["')'"]);
    assert_eq!(diag.position, PREFIX.len() + 6);
}

#[test]
fn invocation_prefers_its_parenthesis() {
    let expr = "list.get(0)";
    let (result, tree) = parse_expr(expr);
    assert_eq!(result.preferred_of(&tree), Some(PREFIX.len() + 8));
    let TreeKind::MethodInvocation { method, .. } = &tree.kind else {
        panic!("not an invocation");
    };
    assert_eq!(result.preferred_of(method), Some(PREFIX.len() + 4));
}

#[test]
fn array_access_prefers_its_bracket() {
    let (result, tree) = parse_expr("xs[1]");
    assert!(matches!(tree.kind, TreeKind::ArrayAccess { .. }));
    assert_eq!(result.preferred_of(&tree), Some(PREFIX.len() + 2));
}
