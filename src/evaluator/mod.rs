//! Tree-walking evaluation of expressions.
//!
//! The evaluator is a [`Mapper`](crate::Mapper) that reduces an expression to a
//! runtime value. It is generic over the value model ([`ValueOps`]) and over a
//! [`Coercion`] policy that decides how constants and exact ratios enter that
//! model:
//!
//! - [`EvaluationMapper`] keeps constants as they are and rationals exact;
//! - [`FloatEvaluationMapper`] coerces constants to floats and evaluates
//!   rationals as true division.
//!
//! # Example
//!
//! ```
//! use symb_mapper::{Context, Expr, Value, evaluate};
//!
//! let x = Expr::variable("x");
//! let expr = Expr::sum([Expr::power(x.clone(), Expr::int(2)), Expr::int(1)]);
//! let ctx = Context::new().bind("x", Value::Int(3));
//! assert_eq!(evaluate(&expr, &ctx), Ok(Value::Int(10)));
//! ```
//!
//! # Modules
//!
//! - [`context`]: layered variable bindings
//! - [`mapper`]: the evaluation mapper and coercion policies

mod context;
mod mapper;

use std::fmt;
use std::sync::Arc;

pub use context::Context;
pub use mapper::{Coercion, EvaluationMapper, Exact, FloatEvaluationMapper, ToFloat};

use crate::Expr;
use crate::core::mapper::Mapper;
use crate::traits::ValueOps;

/// Errors that abort an evaluation
///
/// `E` is the value model's own error type; its failures are carried
/// unchanged in [`EvalError::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError<E> {
    /// A variable has no binding in the context
    UnboundVariable(String),
    /// The node kind has no numeric value
    NotEvaluable { kind: &'static str },
    /// Expression nesting depth exceeds the configured limit
    MaxDepthExceeded,
    /// Expression node count exceeds the configured limit
    MaxNodesExceeded,
    /// Failure raised by the value model
    Value(E),
}

impl<E> From<E> for EvalError<E> {
    fn from(err: E) -> Self {
        EvalError::Value(err)
    }
}

impl<E: fmt::Display> fmt::Display for EvalError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnboundVariable(name) => write!(f, "Unbound variable: {}", name),
            EvalError::NotEvaluable { kind } => {
                write!(f, "Expression of kind '{}' cannot be evaluated", kind)
            }
            EvalError::MaxDepthExceeded => {
                write!(f, "Expression nesting depth exceeds maximum limit")
            }
            EvalError::MaxNodesExceeded => {
                write!(f, "Expression size exceeds maximum node count limit")
            }
            EvalError::Value(err) => write!(f, "{}", err),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for EvalError<E> {}

/// Evaluate `expr` under `context`, keeping constants and rationals exact
#[tracing::instrument(level = "debug", skip_all, fields(hash = expr.structural_hash()))]
pub fn evaluate<V: ValueOps>(
    expr: &Expr,
    context: &Context<'_, V>,
) -> Result<V, EvalError<V::Error>> {
    EvaluationMapper::<V, Exact>::new(context).rec(expr)
}

/// Evaluate `expr` with bindings given as `(name, value)` pairs
///
/// # Example
/// ```
/// use symb_mapper::{Expr, evaluate_kw};
///
/// let expr = Expr::product([Expr::variable("a"), Expr::variable("b")]);
/// assert_eq!(evaluate_kw(&expr, [("a", 2.0), ("b", 4.0)]), Ok(8.0));
/// ```
pub fn evaluate_kw<V, K, I>(expr: &Expr, bindings: I) -> Result<V, EvalError<V::Error>>
where
    V: ValueOps,
    K: Into<Arc<str>>,
    I: IntoIterator<Item = (K, V)>,
{
    let context: Context<V> = bindings.into_iter().collect();
    evaluate(expr, &context)
}

/// Evaluate `expr` under `context`, coercing constants to floats
#[tracing::instrument(level = "debug", skip_all, fields(hash = expr.structural_hash()))]
pub fn evaluate_to_float<V: ValueOps>(
    expr: &Expr,
    context: &Context<'_, V>,
) -> Result<V, EvalError<V::Error>> {
    FloatEvaluationMapper::<V>::new(context).rec(expr)
}
