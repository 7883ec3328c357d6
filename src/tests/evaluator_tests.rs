use num_complex::Complex64;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    Context, EvalError, EvaluationMapper, Exact, Expr, FloatEvaluationMapper, Mapper, NativeFn,
    Number, Value, ValueError, ValueOps, evaluate, evaluate_kw, evaluate_to_float,
};

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

/// A zero-argument function that counts its invocations
fn counter() -> (Arc<AtomicUsize>, Value) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let tick = NativeFn::with_arity("tick", 0, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Int(1))
    });
    (calls, Value::Function(tick))
}

#[test]
fn test_variable_lookup() {
    let ctx = Context::new().bind("x", Value::Int(7));
    assert_eq!(evaluate(&var("x"), &ctx), Ok(Value::Int(7)));

    let empty: Context<Value> = Context::new();
    let err = evaluate(&var("x"), &empty).unwrap_err();
    assert_eq!(err, EvalError::UnboundVariable("x".to_string()));
    assert_eq!(err.to_string(), "Unbound variable: x");
}

#[test]
fn test_variable_free_expression_ignores_context() {
    let expr = Expr::sum([
        Expr::product([Expr::int(3), Expr::int(4)]),
        Expr::floor_div(Expr::int(7), Expr::int(2)),
    ]);
    let empty: Context<Value> = Context::new();
    let busy = Context::new()
        .bind("x", Value::Int(100))
        .bind("y", Value::Float(2.5));
    assert_eq!(evaluate(&expr, &empty), Ok(Value::Int(15)));
    assert_eq!(evaluate(&expr, &empty), evaluate(&expr, &busy));
}

#[test]
fn test_empty_sum_and_product() {
    let empty: Context<Value> = Context::new();
    assert_eq!(
        evaluate(&Expr::sum(Vec::<Expr>::new()), &empty),
        Ok(Value::Int(0))
    );
    assert_eq!(
        evaluate(&Expr::product(Vec::<Expr>::new()), &empty),
        Ok(Value::Int(1))
    );
    let floats: Context<f64> = Context::new();
    assert_eq!(evaluate(&Expr::sum(Vec::<Expr>::new()), &floats), Ok(0.0));
    assert_eq!(evaluate(&Expr::product(Vec::<Expr>::new()), &floats), Ok(1.0));
}

#[test]
fn test_common_subexpression_evaluated_once() {
    let (calls, tick) = counter();
    let ctx = Context::new().bind("tick", tick);

    let shared = Arc::new(Expr::call(var("tick"), Vec::<Expr>::new()));
    let expr = Expr::sum([
        Expr::common_subexpression(Arc::clone(&shared)),
        Expr::common_subexpression(Arc::clone(&shared)),
    ]);
    assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Each top-level call starts with a fresh cache
    assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_common_subexpression_cache_is_structural() {
    let (calls, tick) = counter();
    let ctx = Context::new().bind("tick", tick);

    // Two independently built but identical children share one cache entry
    let expr = Expr::product([
        Expr::common_subexpression(Expr::call(var("tick"), Vec::<Expr>::new())),
        Expr::common_subexpression(Expr::call(var("tick"), Vec::<Expr>::new())),
    ]);
    let mut mapper = EvaluationMapper::<Value, Exact>::new(&ctx);
    assert_eq!(mapper.rec(&expr), Ok(Value::Int(1)));
    assert_eq!(mapper.cached(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Unwrapped calls are not cached
    let plain = Expr::sum([
        Expr::call(var("tick"), Vec::<Expr>::new()),
        Expr::call(var("tick"), Vec::<Expr>::new()),
    ]);
    assert_eq!(evaluate(&plain, &ctx), Ok(Value::Int(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_conditional_only_evaluates_taken_branch() {
    let empty: Context<Value> = Context::new();
    let expr = Expr::conditional(
        Expr::int(5),
        Expr::sum(Vec::<Expr>::new()),
        Expr::call(var("undefined_fn"), Vec::<Expr>::new()),
    );
    assert_eq!(evaluate(&expr, &empty), Ok(Value::Int(0)));

    for criterion in [0, -1] {
        let expr = Expr::conditional(Expr::int(criterion), var("missing"), Expr::int(9));
        assert_eq!(evaluate(&expr, &empty), Ok(Value::Int(9)));
    }
}

#[test]
fn test_conditional_on_complex_criterion_fails() {
    let empty: Context<Value> = Context::new();
    let expr = Expr::conditional(Expr::constant(Number::I), Expr::int(1), Expr::int(2));
    assert!(matches!(
        evaluate(&expr, &empty),
        Err(EvalError::Value(ValueError::Unordered { .. }))
    ));
}

#[test]
fn test_float_variant_coerces_constants() {
    let empty: Context<Value> = Context::new();
    assert_eq!(
        evaluate_to_float(&Expr::int(3), &empty),
        Ok(Value::Float(3.0))
    );
    assert_eq!(evaluate(&Expr::int(3), &empty), Ok(Value::Int(3)));

    let mut mapper = FloatEvaluationMapper::<Value>::new(&empty);
    assert_eq!(
        mapper.rec(&Expr::rational(Expr::int(1), Expr::int(8))),
        Ok(Value::Float(0.125))
    );
}

#[test]
fn test_rational_stays_exact() {
    let empty: Context<Value> = Context::new();
    let third = || Expr::rational(Expr::int(1), Expr::int(3));
    let expr = Expr::sum([third(), third(), third()]);
    assert_eq!(evaluate(&expr, &empty), Ok(Value::Int(1)));
    assert_eq!(
        evaluate(&third(), &empty),
        Ok(Value::ratio(1, 3).unwrap())
    );
    assert_eq!(
        evaluate(&Expr::rational(Expr::int(1), Expr::int(0)), &empty),
        Err(EvalError::Value(ValueError::DivisionByZero))
    );
}

#[test]
fn test_min_max() {
    let empty: Context<Value> = Context::new();
    let children = || [Expr::int(1), Expr::int(5), Expr::float(3.5)];
    assert_eq!(evaluate(&Expr::max(children()), &empty), Ok(Value::Int(5)));
    assert_eq!(evaluate(&Expr::min(children()), &empty), Ok(Value::Int(1)));
    assert_eq!(
        evaluate(&Expr::min(Vec::<Expr>::new()), &empty),
        Err(EvalError::Value(ValueError::EmptyReduction { op: "min" }))
    );
    assert_eq!(
        evaluate(&Expr::max(Vec::<Expr>::new()), &empty),
        Err(EvalError::Value(ValueError::EmptyReduction { op: "max" }))
    );
}

#[test]
fn test_floor_division_and_remainder() {
    let ctx = Context::new()
        .bind("a", Value::Int(-7))
        .bind("b", Value::Int(2));
    assert_eq!(
        evaluate(&Expr::floor_div(var("a"), var("b")), &ctx),
        Ok(Value::Int(-4))
    );
    assert_eq!(
        evaluate(&Expr::remainder(var("a"), var("b")), &ctx),
        Ok(Value::Int(1))
    );
    assert_eq!(
        evaluate(&Expr::quotient(var("a"), var("b")), &ctx),
        Ok(Value::Float(-3.5))
    );
}

#[test]
fn test_rational_floor_division_and_remainder() {
    let empty: Context<Value> = Context::new();
    let low = || Expr::rational(Expr::int(i64::MIN), Expr::int(3));
    assert_eq!(
        evaluate(&Expr::floor_div(low(), Expr::int(1)), &empty),
        Ok(Value::Int(i64::MIN.div_euclid(3)))
    );
    assert_eq!(
        evaluate(&Expr::remainder(low(), Expr::int(1)), &empty),
        Ok(Value::ratio(1, 3).unwrap())
    );

    let minus_seven_thirds = Expr::rational(Expr::int(-7), Expr::int(3));
    let two_thirds = Expr::rational(Expr::int(2), Expr::int(3));
    assert_eq!(
        evaluate(
            &Expr::floor_div(minus_seven_thirds.clone(), two_thirds.clone()),
            &empty
        ),
        Ok(Value::Int(-4))
    );
    assert_eq!(
        evaluate(&Expr::remainder(minus_seven_thirds, two_thirds), &empty),
        Ok(Value::ratio(1, 3).unwrap())
    );
}

#[test]
fn test_value_errors_pass_through() {
    let empty: Context<Value> = Context::new();
    let expr = Expr::quotient(Expr::int(1), Expr::sum([Expr::int(1), Expr::int(-1)]));
    assert_eq!(
        evaluate(&expr, &empty),
        Err(EvalError::Value(ValueError::DivisionByZero))
    );
    assert_eq!(
        evaluate(&Expr::call(Expr::int(3), Vec::<Expr>::new()), &empty),
        Err(EvalError::Value(ValueError::NotCallable { type_name: "int" }))
    );
}

#[test]
fn test_call_subscript_lookup() {
    let square = Value::Function(NativeFn::with_arity("square", 1, |args| {
        args[0].clone().try_mul(args[0].clone())
    }));
    let point = Value::record([("x", Value::Int(2)), ("y", Value::Int(6))]);
    let ctx = Context::new()
        .bind("square", square)
        .bind("p", point)
        .bind("v", Value::List(vec![Value::Int(10), Value::Int(20)]));

    let expr = Expr::sum([
        Expr::call(var("square"), [Expr::lookup(var("p"), "y")]),
        Expr::subscript(var("v"), Expr::int(-1)),
    ]);
    assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(56)));
    assert!(matches!(
        evaluate(&Expr::lookup(var("p"), "z"), &ctx),
        Err(EvalError::Value(ValueError::NoAttribute { .. }))
    ));
}

#[test]
fn test_aggregates() {
    let ctx = Context::new().bind("x", Value::Int(2));
    let list = Expr::list([var("x"), Expr::int(3)]);
    assert_eq!(
        evaluate(&list, &ctx),
        Ok(Value::List(vec![Value::Int(2), Value::Int(3)]))
    );
    let tuple = Expr::tuple([Expr::product([var("x"), var("x")])]);
    assert_eq!(
        evaluate(&tuple, &ctx),
        Ok(Value::Tuple(vec![Value::Int(4)]))
    );

    let array = Expr::array([2usize, 2], [var("x"), Expr::int(0), Expr::int(0), var("x")]).unwrap();
    let value = evaluate(&array, &ctx).unwrap();
    match &value {
        Value::Array(a) => {
            assert_eq!(a.shape(), [2, 2]);
            assert_eq!(a.get(&[1, 1]), Some(&Value::Int(2)));
            assert_eq!(a.get(&[0, 1]), Some(&Value::Int(0)));
        }
        other => panic!("expected array, got {}", other),
    }
    let cell = Expr::subscript(
        array,
        Expr::tuple([Expr::int(1), Expr::int(1)]),
    );
    assert_eq!(evaluate(&cell, &ctx), Ok(Value::Int(2)));
}

#[test]
fn test_complex_arithmetic() {
    let empty: Context<Value> = Context::new();
    let i_squared = Expr::product([Expr::constant(Number::I), Expr::constant(Number::I)]);
    assert_eq!(
        evaluate(&i_squared, &empty),
        Ok(Value::Complex(Complex64::new(-1.0, 0.0)))
    );
}

#[test]
fn test_substitution() {
    let ctx = Context::new()
        .bind("x", Value::Int(3))
        .bind("y", Value::Int(1));

    // (x + y)[x := 10]
    let expr = Expr::substitution(Expr::sum([var("x"), var("y")]), ["x"], [Expr::int(10)]).unwrap();
    assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(11)));
    assert_eq!(ctx.get("x"), Some(&Value::Int(3)));

    // Values are evaluated in the enclosing scope: (x + 1)[x := 2x] at x = 3
    let expr = Expr::substitution(
        Expr::sum([var("x"), Expr::int(1)]),
        ["x"],
        [Expr::product([Expr::int(2), var("x")])],
    )
    .unwrap();
    assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(7)));

    // A name bound only by the substitution is not visible outside it
    let empty: Context<Value> = Context::new();
    let scoped = Expr::sum([
        Expr::substitution(var("t"), ["t"], [Expr::int(1)]).unwrap(),
        var("t"),
    ]);
    assert_eq!(
        evaluate(&scoped, &empty),
        Err(EvalError::UnboundVariable("t".to_string()))
    );
}

#[test]
fn test_derivative_is_not_evaluable() {
    let expr = Expr::derivative(var("f"), ["x"]);
    let err = evaluate_kw(&expr, [("f", Value::Int(1))]).unwrap_err();
    assert_eq!(err, EvalError::NotEvaluable { kind: "Derivative" });
    assert!(err.to_string().contains("Derivative"));
}

#[test]
fn test_plain_float_values() {
    let expr = Expr::sum([
        Expr::power(var("x"), Expr::float(0.5)),
        Expr::remainder(Expr::int(-7), Expr::int(3)),
    ]);
    assert_eq!(evaluate_kw(&expr, [("x", 16.0)]), Ok(6.0));
    assert!(matches!(
        evaluate_kw(&Expr::list([var("x")]), [("x", 1.0)]),
        Err(EvalError::Value(ValueError::Unsupported { op: "list", .. }))
    ));
}

/// Generic wrapper: the value type carries no `'static` bound
fn squared<V: ValueOps>(x: V) -> Result<V, EvalError<V::Error>> {
    let expr = Expr::power(var("x"), Expr::int(2));
    evaluate_kw(&expr, [("x", x)])
}

#[test]
fn test_evaluate_kw_from_generic_code() {
    assert_eq!(squared(Value::Int(3)), Ok(Value::Int(9)));
    assert_eq!(squared(1.5f64), Ok(2.25));
}
