//! End-to-End Parser Benchmarks
//!
//! Measures lexing, parsing, and rendering across input sizes and error
//! densities. Benchmarks are organized into the following categories:
//!
//! - **Declarations**: Small compilation units of each declaration kind
//! - **Expressions**: Operator-heavy and lambda-heavy initializers
//! - **Recovery**: Inputs with many independent syntax errors
//! - **Scaling**: Generated classes with a growing number of members
//! - **Pool**: Batches parsed on a pool of contexts
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench declarations
//! cargo bench scaling
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use javelin_syntax::{ParserConfig, ParserPool, parse, parse_source, render, tokenize};

const REALISTIC: &str = r#"
package com.example.app;

import java.util.*;
import java.util.function.Function;

/** Entry point. */
public final class App<T extends Comparable<T>> implements Runnable {
    private static final int LIMIT = 1 << 4;
    private final List<T> items = new ArrayList<>();

    public App(Collection<? extends T> initial) {
        items.addAll(initial);
    }

    @Override
    public void run() {
        for (int i = 0; i < LIMIT && i < items.size(); i++) {
            T item = items.get(i);
            if (item instanceof String s && !s.isEmpty()) {
                System.out.println(s);
            }
        }
        Function<T, String> show = t -> String.valueOf(t);
        switch (items.size()) {
            case 0 -> System.out.println("empty");
            default -> {
                try {
                    items.sort(null);
                } catch (ClassCastException | IllegalStateException e) {
                    throw new RuntimeException(e);
                }
            }
        }
    }
}
"#;

fn generated_class(members: usize) -> String {
    let mut source = String::from("class Generated {\n");
    for i in 0..members {
        source.push_str(&format!(
            "    private int f{i} = {i};\n    int m{i}(int a, int b) {{ return a * f{i} + b; }}\n"
        ));
    }
    source.push_str("}\n");
    source
}

// ============================================================================
// Declaration Benchmarks
// ============================================================================

fn bench_declarations(c: &mut Criterion) {
    let mut group = c.benchmark_group("declarations");

    let sources = vec![
        ("empty_class", "class A {}"),
        ("generic_class", "class A<T extends B<T>> extends C implements D, E {}"),
        ("interface", "interface I { void a(); default int b() { return 1; } }"),
        ("enum", "enum Color { RED, GREEN(1), BLUE { void x() {} }; Color() {} }"),
        ("record", "record Point(int x, int y) { Point { assert x >= 0; } }"),
        ("implicit_class", "int counter;\nvoid main() { counter++; }"),
        ("realistic", REALISTIC),
    ];

    for (name, source) in sources {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, s| {
            b.iter(|| parse_source(black_box(s)));
        });
    }

    group.finish();
}

// ============================================================================
// Expression Benchmarks
// ============================================================================

fn bench_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("expressions");

    let exprs = vec![
        ("arithmetic", "a + b * c - d / e % f << 2"),
        ("logical", "a != null && a instanceof String s && !s.isEmpty() || b"),
        ("casts", "(int) (long) (Object) (Runnable & Serializable) x"),
        ("lambdas", "(a, b) -> c -> d -> a + b + c + d"),
        ("creators", "new int[][] {{1, 2}, {3}}"),
        ("switch", "switch (k) { case 1 -> 2; case 2, 3 -> 4; default -> 5; }"),
    ];

    for (name, expr) in exprs {
        let source = format!("class T {{ Object f = {expr}; }}");
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, s| {
            b.iter(|| parse_source(black_box(s)));
        });
    }

    group.finish();
}

// ============================================================================
// Recovery Benchmarks
// ============================================================================

fn bench_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("recovery");

    let mut missing_bodies = String::from("class A {\n");
    for i in 0..200 {
        missing_bodies.push_str(&format!("    int m{i}()\n"));
    }
    missing_bodies.push_str("}\n");

    let unclosed: String = (0..100).map(|i| format!("class C{i} {{\n")).collect();
    let garbage = "class A { void m() { ) ) ] ] } } + + class B { int x = ; }".repeat(50);

    let sources = vec![
        ("missing_bodies", missing_bodies),
        ("unclosed_classes", unclosed),
        ("garbage", garbage),
    ];

    for (name, source) in sources {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, s| {
            b.iter(|| parse_source(black_box(s)));
        });
    }

    group.finish();
}

// ============================================================================
// Scaling Benchmarks
// ============================================================================

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for members in [10, 100, 1000] {
        let source = generated_class(members);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), &source, |b, s| {
            b.iter(|| parse_source(black_box(s)));
        });
    }

    group.finish();
}

// ============================================================================
// Pool Benchmarks
// ============================================================================

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    let sources: Vec<String> = (0..64).map(|_| generated_class(50)).collect();
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    group.throughput(Throughput::Elements(refs.len() as u64));

    for workers in [1, 2, 4, 8] {
        let pool = ParserPool::new(workers, ParserConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(workers), &refs, |b, inputs| {
            b.iter(|| pool.parse_sources(black_box(inputs)));
        });
    }

    group.finish();
}

// ============================================================================
// Pipeline Stages (Lexer vs Parser vs Printer)
// ============================================================================

fn bench_pipeline_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_stages");

    group.bench_function("01_lexer_only", |b| {
        b.iter(|| tokenize(black_box(REALISTIC)));
    });

    let tokens = tokenize(REALISTIC).tokens;
    group.bench_function("02_parse_only", |b| {
        b.iter(|| parse(black_box(tokens.clone())));
    });

    let unit = parse_source(REALISTIC).unit;
    group.bench_function("03_render_only", |b| {
        b.iter(|| render(black_box(&unit)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_declarations,
    bench_expressions,
    bench_recovery,
    bench_scaling,
    bench_pool,
    bench_pipeline_stages,
);

criterion_main!(benches);
