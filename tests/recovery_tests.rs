//! Error Recovery Tests
//!
//! Broken inputs must produce a complete tree, keep every token, and report
//! each independent mistake once.

mod common;

use common::{erroneous_count, members, parse_checked, raw_diagnostics, top_level};
use javelin_syntax::{DiagnosticCode, LabelRole, ParseContext, ParserConfig, TreeKind, render};

#[test]
fn nested_unclosed_classes_report_once() {
    let source: String = (0..100).map(|i| format!("class C{i} {{\n")).collect();
    let result = parse_checked(&source);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::PrematureEof);

    let mut depth = 0;
    let mut class = &top_level(&result)[0];
    while let Some(inner) = members(class).first() {
        class = inner;
        depth += 1;
    }
    assert_eq!(depth, 99);
}

#[test]
fn junk_between_types_is_one_error() {
    let source = "class A {} + + class B {}";
    let result = parse_checked(source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::ClassMethodOrFieldExpected);
    assert_eq!(result.diagnostics[0].position, source.find('+').unwrap_or_default());
    let names: Vec<_> = top_level(&result)
        .iter()
        .filter_map(|decl| match &decl.kind {
            TreeKind::ClassDecl(class) => Some(class.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn unclosed_argument_list() {
    let source = "class A { void m() { foo(1, 2; bar(); } }";
    let result = parse_checked(source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::Expected);
    assert_eq!(diag.args, vec!["')'"]);
    assert_eq!(Some(diag.position), source.find("2;").map(|p| p + 1));
}

#[test]
fn broken_import_does_not_lose_the_class() {
    let result = parse_checked("import java.util.; class A { int x; }");
    assert!(result.has_errors());
    assert!(top_level(&result).iter().any(|decl| decl.name() == Some("A")));
}

#[test]
fn every_independent_error_is_reported() {
    let source = "class A {\n  int m()\n  void n() { else ; }\n}";
    let result = parse_checked(source);
    let raw = raw_diagnostics(source, &result);
    assert_eq!(raw.len(), 2, "{raw:?}");
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::ExpectedOneOf);
    assert_eq!(result.diagnostics[1].code, DiagnosticCode::ElseWithoutIf);
}

#[test]
fn nesting_limit_is_reported_once() {
    let mut context = ParseContext::new(ParserConfig::default().with_max_nesting_depth(4));
    let source = "class A { int x = ((((((1)))))); int y; }";
    let result = context.parse_source(source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::TooDeeplyNested);
    common::assert_spans_contained(&result);
    let class = &top_level(&result)[0];
    assert_eq!(members(class).len(), 2);
}

#[test]
fn malformed_literal_is_reported_by_kind() {
    let source = "class A { String s = \"open; int x; }";
    let result = parse_checked(source);
    assert!(result.has_errors());
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::UnclosedStringLiteral);
}

#[test]
fn lexer_diagnostics_come_first() {
    let source = "class A { int x = ; } /* open";
    let result = parse_checked(source);
    let codes: Vec<_> = result.diagnostics.iter().map(|diag| diag.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::UnclosedComment, DiagnosticCode::IllegalStartOfExpr]
    );
}

#[test]
fn unexpected_character_becomes_an_erroneous_node() {
    let result = parse_checked("class A { int x = #; }");
    assert!(
        result
            .diagnostics
            .iter()
            .any(|diag| diag.code == DiagnosticCode::IllegalChar),
        "{:?}",
        result.diagnostics
    );
    assert!(erroneous_count(&result) >= 1);
}

#[test]
fn truncated_inputs_never_panic() {
    let source = "package p; import a.b.*; @A(x = 1) public class C<T extends D<T>> extends E \
                  implements F { private int[] xs = {1, 2}; C() { super(); } \
                  <R> R map(Function<? super T, ? extends R> f) throws X { \
                  for (int i = 0; i < xs.length; i++) { if (xs[i] > 0) return f.apply(null); } \
                  switch (k) { case 1 -> { yield 2; } default -> throw new Y(); } \
                  return (R) (Object) new int[] {1}; } }";
    let cuts = source
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(source.len()));
    for cut in cuts {
        let result = parse_checked(&source[..cut]);
        if cut == source.len() {
            assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        }
    }
}

#[test]
fn recovery_threshold_bounds_repeated_errors() {
    let mut context = ParseContext::new(ParserConfig::default().with_recovery_threshold(1));
    let result = context.parse_source("class A { void m() { ) ) ) ) ) ) ) ) } }");
    assert!(result.has_errors());
    common::assert_spans_contained(&result);
}

#[test]
fn illegal_character_names_the_character() {
    let result = parse_checked("class A { int x = #; }");
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::IllegalChar);
    assert_eq!(diag.args, vec!["#"]);
    assert_eq!(diag.message, "illegal character: '#'");
}

#[test]
fn tokens_consumed_before_a_failure_stay_in_the_tree() {
    let source = "class A { Map<String, > x; int y; }";
    let result = parse_checked(source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    let text = render(&result.unit);
    assert!(text.contains("Map, <, String, ,)"), "{text}");
    assert!(text.contains("int y;"), "{text}");
}

#[test]
fn dangling_type_parameters_report_once() {
    let source = "class A { public <T> }";
    let result = parse_checked(source);
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(Some(result.diagnostics[0].position), source.find('}'));
}

#[test]
fn orphaned_else_keeps_its_keyword() {
    let source = "class A { void m() { else x(); } }";
    let result = parse_checked(source);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::ElseWithoutIf);
    let text = render(&result.unit);
    assert!(text.contains("(ERROR: else, x()"), "{text}");
}

#[test]
fn syntax_errors_carry_a_primary_label() {
    let source = "class A { void m() { foo(1, 2; } }";
    let result = parse_checked(source);
    let diag = &result.diagnostics[0];
    assert_eq!(diag.labels.len(), 1);
    assert_eq!(diag.labels[0].role, LabelRole::Primary);
    assert_eq!(diag.labels[0].span, diag.span);
    assert_eq!(diag.labels[0].message, "expected here");
}

#[test]
fn misplaced_declaration_suggests_a_block() {
    let result = parse_checked("class A { void m() { if (c) int x = 1; } }");
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::VariableNotAllowed);
    assert_eq!(diag.help.as_deref(), Some("wrap the declaration in a block"));
}
