//! Concurrent Parsing Tests
//!
//! Parses spread over a pool must agree with parses run one after another,
//! and no parse may observe another's diagnostics or positions.

mod common;

use javelin_syntax::{ParseResult, ParserConfig, ParserPool, parse_source, tokenize};

fn sources() -> Vec<String> {
    (0..40)
        .map(|i| match i % 4 {
            0 => format!("class C{i} {{ int f{i} = {i} + 1; }}"),
            1 => format!("class C{i} {{ int m() }}"),
            2 => format!("void main() {{ else ; int x = {i}; }}"),
            _ => format!("enum E{i} {{ A, B, C void t() {{}} }}"),
        })
        .collect()
}

fn fingerprint(result: &ParseResult) -> (String, Vec<String>) {
    let codes = result
        .diagnostics
        .iter()
        .map(|diag| format!("{}@{}", diag.code, diag.position))
        .collect();
    (result.unit.shape(), codes)
}

#[test]
fn parallel_results_match_sequential_ones() {
    let sources = sources();
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let pool = ParserPool::new(4, ParserConfig::default());

    let parallel = pool.parse_sources(&refs);
    assert_eq!(parallel.len(), refs.len());
    for (source, result) in refs.iter().zip(&parallel) {
        let sequential = parse_source(source);
        assert_eq!(fingerprint(result), fingerprint(&sequential), "{source}");
        common::assert_spans_contained(result);
    }
}

#[test]
fn parse_all_takes_token_streams() {
    let pool = ParserPool::new(2, ParserConfig::default());
    let inputs = vec![
        tokenize("class A {}").tokens,
        tokenize("class B { void m() { foo(; } }").tokens,
        tokenize("interface I { void run(); }").tokens,
    ];
    let results = pool.parse_all(inputs);
    assert_eq!(results.len(), 3);
    assert!(!results[0].has_errors());
    assert!(results[1].has_errors());
    assert!(!results[2].has_errors());
}

#[test]
fn positions_belong_to_their_own_parse() {
    let pool = ParserPool::new(3, ParserConfig::default());
    let results = pool.parse_sources(&["class A {}", "class B {}", "class C {}"]);
    for (i, result) in results.iter().enumerate() {
        assert!(result.span_of(&result.unit).is_some());
        for (j, other) in results.iter().enumerate() {
            if i != j {
                assert!(result.positions.try_span_of(other.unit.id).is_err());
            }
        }
    }
}

#[test]
fn reused_context_starts_clean() {
    let pool = ParserPool::new(1, ParserConfig::default());
    let first = pool.parse_source("class A { int m() }");
    let second = pool.parse_source("class A {}");
    assert_eq!(first.diagnostics.len(), 1);
    assert!(second.diagnostics.is_empty());
    assert!(second.positions.try_span_of(first.unit.id).is_err());
}

#[test]
fn pool_has_at_least_one_worker() {
    assert_eq!(ParserPool::new(0, ParserConfig::default()).workers(), 1);
    assert_eq!(ParserPool::new(5, ParserConfig::default()).workers(), 5);
}

#[test]
fn pool_config_applies_to_every_worker() {
    let config = ParserConfig::default().with_implicit_classes(false);
    let pool = ParserPool::new(2, config);
    let results = pool.parse_sources(&["void main() {}", "int x;"]);
    assert!(results.iter().all(ParseResult::has_errors));
}

#[test]
fn pool_is_shared_across_threads() {
    let pool = ParserPool::new(2, ParserConfig::default());
    std::thread::scope(|scope| {
        for i in 0..8 {
            let pool = &pool;
            scope.spawn(move || {
                let result = pool.parse_source(&format!("class T{i} {{ int x = {i}; }}"));
                assert!(!result.has_errors());
                assert!(result.unit.shape().contains(&format!("\"T{i}\"")));
            });
        }
    });
}
