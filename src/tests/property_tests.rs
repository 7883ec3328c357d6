//! Property-Based Testing
//!
//! Uses quickcheck for property-based testing of:
//! - Horner evaluation against the expanded sum of powers
//! - Context invariance of variable-free expressions
//! - Floor division / remainder identities
//! - Structural hashing of independently built trees

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use crate::{Context, Expr, Value, evaluate};

// ============================================================
// PART 1: EXPRESSION GENERATORS
// ============================================================

/// Variable-free integer expression
#[derive(Debug, Clone)]
struct ClosedExpr(Expr);

fn gen_closed(g: &mut Gen, depth: usize) -> Expr {
    if depth == 0 {
        return Expr::int(i64::from(i8::arbitrary(g)));
    }
    let choice: u8 = u8::arbitrary(g) % 8;
    let pair = |g: &mut Gen| [gen_closed(g, depth - 1), gen_closed(g, depth - 1)];
    match choice {
        0 => Expr::sum(pair(g)),
        1 => Expr::product(pair(g)),
        2 => {
            let [a, b] = pair(g);
            Expr::floor_div(a, b)
        }
        3 => {
            let [a, b] = pair(g);
            Expr::remainder(a, b)
        }
        4 => Expr::min(pair(g)),
        5 => Expr::max(pair(g)),
        6 => Expr::common_subexpression(gen_closed(g, depth - 1)),
        _ => Expr::int(i64::from(i8::arbitrary(g))),
    }
}

impl Arbitrary for ClosedExpr {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(4);
        ClosedExpr(gen_closed(g, depth))
    }
}

/// Sparse polynomial terms with small exponents, strictly decreasing
fn normalize_terms(raw: Vec<(u8, i8)>) -> Vec<(u32, i64)> {
    let mut terms: Vec<(u32, i64)> = raw
        .into_iter()
        .map(|(e, c)| (u32::from(e % 7), i64::from(c)))
        .collect();
    terms.sort_by(|a, b| b.0.cmp(&a.0));
    terms.dedup_by_key(|t| t.0);
    terms
}

// ============================================================
// PART 2: PROPERTIES
// ============================================================

#[cfg(test)]
mod evaluation_properties {
    use super::*;

    /// Property: Horner evaluation equals sum(c * b^e)
    #[test]
    fn prop_horner_matches_expansion() {
        fn prop(raw: Vec<(u8, i8)>, base: i8) -> TestResult {
            let terms = normalize_terms(raw);
            if terms.is_empty() {
                return TestResult::discard();
            }
            let x = Expr::variable("x");
            let poly = Expr::polynomial(
                x.clone(),
                terms.iter().map(|&(e, c)| (e, Expr::int(c))),
            )
            .unwrap();
            let expanded = Expr::sum(terms.iter().map(|&(e, c)| {
                Expr::product([Expr::int(c), Expr::power(x.clone(), Expr::int(i64::from(e)))])
            }));

            let ctx = Context::new().bind("x", Value::Int(i64::from(base)));
            TestResult::from_bool(evaluate(&poly, &ctx) == evaluate(&expanded, &ctx))
        }
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop as fn(Vec<(u8, i8)>, i8) -> TestResult);
    }

    /// Property: bindings never change the value of a variable-free tree
    #[test]
    fn prop_context_invariance() {
        fn prop(expr: ClosedExpr, x: i64) -> bool {
            let empty: Context<Value> = Context::new();
            let busy = Context::new()
                .bind("x", Value::Int(x))
                .bind("y", Value::Float(0.5));
            evaluate(&expr.0, &empty) == evaluate(&expr.0, &busy)
        }
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop as fn(ClosedExpr, i64) -> bool);
    }

    /// Property: (a // b) * b + a % b == a, and the remainder takes the sign of b
    #[test]
    fn prop_floor_identity() {
        fn prop(a: i32, b: i32) -> TestResult {
            if b == 0 {
                return TestResult::discard();
            }
            let (av, bv) = (Expr::int(i64::from(a)), Expr::int(i64::from(b)));
            let identity = Expr::sum([
                Expr::product([Expr::floor_div(av.clone(), bv.clone()), bv.clone()]),
                Expr::remainder(av.clone(), bv.clone()),
            ]);
            let empty: Context<Value> = Context::new();
            let rebuilt = evaluate(&identity, &empty);
            let rem = evaluate(&Expr::remainder(av, bv), &empty);
            let sign_ok = match rem {
                Ok(Value::Int(r)) => r == 0 || (r < 0) == (b < 0),
                _ => false,
            };
            TestResult::from_bool(rebuilt == Ok(Value::Int(i64::from(a))) && sign_ok)
        }
        QuickCheck::new()
            .tests(300)
            .quickcheck(prop as fn(i32, i32) -> TestResult);
    }

    /// Property: max >= min over any non-empty set of integers
    #[test]
    fn prop_max_not_below_min() {
        fn prop(values: Vec<i64>) -> TestResult {
            if values.is_empty() {
                return TestResult::discard();
            }
            let children = || values.iter().map(|&v| Expr::int(v));
            let empty: Context<Value> = Context::new();
            match (
                evaluate(&Expr::max(children()), &empty),
                evaluate(&Expr::min(children()), &empty),
            ) {
                (Ok(Value::Int(hi)), Ok(Value::Int(lo))) => TestResult::from_bool(
                    hi >= lo
                        && Some(&hi) == values.iter().max()
                        && Some(&lo) == values.iter().min(),
                ),
                _ => TestResult::failed(),
            }
        }
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop as fn(Vec<i64>) -> TestResult);
    }
}

#[cfg(test)]
mod structure_properties {
    use super::*;

    /// Property: independently built copies of a tree are equal and hash equal
    #[test]
    fn prop_structural_equality() {
        fn prop(expr: ClosedExpr) -> bool {
            let copy = rebuild(&expr.0);
            expr.0 == copy && expr.0.structural_hash() == copy.structural_hash()
        }
        QuickCheck::new()
            .tests(100)
            .quickcheck(prop as fn(ClosedExpr) -> bool);
    }

    /// Deep copy that shares nothing with the input
    fn rebuild(expr: &Expr) -> Expr {
        use crate::ExprKind;
        let all = |children: &[std::sync::Arc<Expr>]| -> Vec<Expr> {
            children.iter().map(|c| rebuild(c)).collect()
        };
        match expr.kind() {
            ExprKind::Constant(n) => Expr::constant(*n),
            ExprKind::Sum(c) => Expr::sum(all(c)),
            ExprKind::Product(c) => Expr::product(all(c)),
            ExprKind::Min(c) => Expr::min(all(c)),
            ExprKind::Max(c) => Expr::max(all(c)),
            ExprKind::FloorDiv {
                numerator,
                denominator,
            } => Expr::floor_div(rebuild(numerator), rebuild(denominator)),
            ExprKind::Remainder {
                numerator,
                denominator,
            } => Expr::remainder(rebuild(numerator), rebuild(denominator)),
            ExprKind::CommonSubexpression(child) => Expr::common_subexpression(rebuild(child)),
            other => Expr::new(other.clone()),
        }
    }
}
