//! Common test utilities
//!
//! Shared helpers for the integration suites.
//!
//! # Parsing Helpers
//! - [`parse_cleanly`] - Parse source and panic on any diagnostic
//! - [`top_level`] / [`members`] - Reach into a unit without boilerplate
//!
//! # Structural Checks
//! - [`assert_spans_contained`] - Every child span lies inside its parent's
//! - [`assert_tokens_accounted`] - Every input token is covered by the tree
//! - [`assert_render_fixed_point`] - Rendering and reparsing keeps the shape

#![allow(dead_code)]

use javelin_syntax::ast::visitors::ContainmentChecker;
use javelin_syntax::{
    Diag, ParseResult, SourceFile, Span, TokenKind, Tree, TreeKind, parse_source, render, tokenize,
};

/// Format diagnostics for display in assertion messages.
pub fn format_diagnostics(diags: &[Diag]) -> String {
    diags
        .iter()
        .map(|diag| format!("{diag} at {:?}", diag.span))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compact `line:col:code` forms, in order.
pub fn raw_diagnostics(source: &str, result: &ParseResult) -> Vec<String> {
    result.raw_diagnostics(&SourceFile::new(source))
}

/// Parse `source`, panicking with the diagnostics if there are any.
pub fn parse_cleanly(source: &str) -> ParseResult {
    let result = parse_source(source);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics for `{source}`:\n{}",
        format_diagnostics(&result.diagnostics)
    );
    result
}

/// Declarations directly under the compilation unit.
pub fn top_level(result: &ParseResult) -> &[Tree] {
    match &result.unit.kind {
        TreeKind::CompilationUnit { decls, .. } => decls,
        _ => panic!("root is not a compilation unit"),
    }
}

/// Members of a class declaration.
pub fn members(class: &Tree) -> &[Tree] {
    match &class.kind {
        TreeKind::ClassDecl(class) => &class.members,
        _ => panic!("not a class: {}", class.shape()),
    }
}

/// Statements of the body of the first method of the first class.
pub fn first_method_body(result: &ParseResult) -> &[Tree] {
    let class = &top_level(result)[0];
    for member in members(class) {
        if let TreeKind::MethodDecl(method) = &member.kind {
            if let Some(body) = &method.body {
                if let TreeKind::Block { stats, .. } = &body.kind {
                    return stats;
                }
            }
        }
    }
    panic!("no method body in {}", class.shape());
}

/// Parses `source` and asserts span containment and token coverage.
pub fn parse_checked(source: &str) -> ParseResult {
    let result = parse_source(source);
    assert_spans_contained(&result);
    assert_tokens_accounted(source, &result);
    result
}

pub fn assert_spans_contained(result: &ParseResult) {
    if let Some(violation) = ContainmentChecker::check(&result.unit, &result.positions) {
        panic!("span containment violated: {violation:?}");
    }
}

/// What the innermost node around a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Node,
    Erroneous,
    Skipped,
}

fn collect_holders(result: &ParseResult, tree: &Tree, depth: usize, out: &mut Vec<(Span, usize, Holder)>) {
    if let Some(span) = result.span_of(tree) {
        let holder = match tree.kind {
            TreeKind::Erroneous { .. } => Holder::Erroneous,
            TreeKind::Skipped { .. } => Holder::Skipped,
            _ => Holder::Node,
        };
        out.push((span, depth, holder));
    }
    for child in tree.children() {
        collect_holders(result, child, depth + 1, out);
    }
}

/// Every token is kept by the tree. The innermost node around each token must
/// be a skipped-token leaf or a well-formed node: an erroneous node may only
/// hold tokens through its children. Only stray top-level `;` tokens may fall
/// outside every declaration.
pub fn assert_tokens_accounted(source: &str, result: &ParseResult) {
    let mut holders = Vec::new();
    for child in result.unit.children() {
        collect_holders(result, child, 1, &mut holders);
    }

    for token in tokenize(source).tokens {
        if token.kind.is_trivia() || token.kind == TokenKind::Eof {
            continue;
        }
        let innermost = holders
            .iter()
            .filter(|(span, _, _)| span.start <= token.span.start && token.span.end <= span.end)
            .max_by_key(|(_, depth, _)| *depth);
        match innermost {
            Some((span, _, Holder::Erroneous)) => panic!(
                "token {token} at {:?} is swallowed by the erroneous node at {span:?} in `{source}`",
                token.span
            ),
            Some(_) => {}
            None => assert!(
                token.kind == TokenKind::Semicolon,
                "token {token} at {:?} is not covered by any top-level node in `{source}`",
                token.span
            ),
        }
    }
}

/// Renders the tree, reparses the text and compares shapes; then checks the
/// rendered text is itself stable.
pub fn assert_render_fixed_point(source: &str) -> String {
    let first = parse_cleanly(source);
    let text = render(&first.unit);
    let second = parse_source(&text);
    assert!(
        second.diagnostics.is_empty(),
        "rendered text does not parse:\n{text}\n{}",
        format_diagnostics(&second.diagnostics)
    );
    assert_eq!(first.unit.shape(), second.unit.shape(), "shape changed after rendering:\n{text}");
    assert_eq!(render(&second.unit), text, "rendering is not stable");
    text
}

/// All erroneous nodes in the tree.
pub fn erroneous_count(result: &ParseResult) -> usize {
    result.erroneous_nodes().len()
}
