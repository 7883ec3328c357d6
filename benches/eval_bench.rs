use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use symb_mapper::{Context, Evaluate, Expr, Value, evaluate, evaluate_to_float};

// =============================================================================
// Expression Generators
// =============================================================================

/// Dense polynomial of degree `n` with coefficients 1..=n+1
fn dense_polynomial(n: u32) -> Expr {
    let terms = (0..=n).rev().map(|e| (e, Expr::int(i64::from(e) + 1)));
    Expr::polynomial(Expr::variable("x"), terms).unwrap()
}

/// The same polynomial spelled out as a sum of powers
fn expanded_polynomial(n: u32) -> Expr {
    Expr::sum((0..=n).rev().map(|e| {
        Expr::product([
            Expr::int(i64::from(e) + 1),
            Expr::power(Expr::variable("x"), Expr::int(i64::from(e))),
        ])
    }))
}

/// Sum of `n` references to one shared subtree, with and without CSE markers
fn shared_terms(n: usize, mark: bool) -> Expr {
    let inner = Arc::new(expanded_polynomial(12));
    Expr::sum((0..n).map(|_| {
        if mark {
            Expr::common_subexpression(Arc::clone(&inner))
        } else {
            Expr::sum([Arc::clone(&inner)])
        }
    }))
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_polynomial(c: &mut Criterion) {
    let mut group = c.benchmark_group("polynomial");
    let ctx = Context::new().bind("x", Value::Int(3));

    let horner = dense_polynomial(20);
    let expanded = expanded_polynomial(20);

    group.bench_function("horner_deg20", |b| {
        b.iter(|| evaluate(black_box(&horner), &ctx))
    });

    group.bench_function("expanded_deg20", |b| {
        b.iter(|| evaluate(black_box(&expanded), &ctx))
    });

    let floats = Context::new().bind("x", 1.5f64);
    group.bench_function("horner_deg20_f64", |b| {
        b.iter(|| evaluate_to_float(black_box(&horner), &floats))
    });

    group.finish();
}

fn bench_common_subexpressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("common_subexpressions");
    let ctx = Context::new().bind("x", Value::Int(2));

    let marked = shared_terms(50, true);
    let unmarked = shared_terms(50, false);

    group.bench_function("marked_x50", |b| {
        b.iter(|| evaluate(black_box(&marked), &ctx))
    });

    group.bench_function("unmarked_x50", |b| {
        b.iter(|| evaluate(black_box(&unmarked), &ctx))
    });

    group.finish();
}

fn bench_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("limits");
    let ctx = Context::new().bind("x", Value::Int(2));
    let expr = expanded_polynomial(40);

    group.bench_function("evaluate_with_limits", |b| {
        let builder = Evaluate::with_limits();
        b.iter(|| builder.evaluate(black_box(&expr), &ctx))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_polynomial,
    bench_common_subexpressions,
    bench_limits
);
criterion_main!(benches);
