//! Parallel batch conversion and evaluation using Rayon
//!
//! Each item gets its own mapper, so evaluation caches are never shared
//! between threads. Results come back in input order.
//!
//! Enable with the `parallel` feature:
//! ```toml
//! symb_mapper = { version = "0.1", features = ["parallel"] }
//! ```

use rayon::prelude::*;

use crate::Expr;
use crate::convert::{ConvertError, Converter, ForeignExpr};
use crate::evaluator::{Context, EvalError, evaluate};
use crate::traits::ValueOps;

/// Convert many independent foreign trees.
///
/// # Example
/// ```
/// use symb_mapper::{Converter, Expr, ForeignExpr};
/// use symb_mapper::parallel::convert_batch;
///
/// let nodes: Vec<ForeignExpr> = (1..=3).map(ForeignExpr::Int).collect();
/// let exprs = convert_batch(&Converter::new(), &nodes);
/// assert_eq!(exprs[2], Ok(Expr::int(3)));
/// ```
pub fn convert_batch(
    converter: &Converter,
    nodes: &[ForeignExpr],
) -> Vec<Result<Expr, ConvertError>> {
    nodes.par_iter().map(|node| converter.convert(node)).collect()
}

/// Evaluate one expression under many contexts.
///
/// # Example
/// ```
/// use symb_mapper::{Context, Expr};
/// use symb_mapper::parallel::evaluate_batch;
///
/// let expr = Expr::power(Expr::variable("x"), Expr::int(2));
/// let points: Vec<Context<f64>> = [1.0, 2.0, 3.0]
///     .into_iter()
///     .map(|x| Context::new().bind("x", x))
///     .collect();
/// let values = evaluate_batch(&expr, &points);
/// assert_eq!(values[2], Ok(9.0));
/// ```
pub fn evaluate_batch<V>(
    expr: &Expr,
    contexts: &[Context<'_, V>],
) -> Vec<Result<V, EvalError<V::Error>>>
where
    V: ValueOps + Send + Sync,
    V::Error: Send,
{
    contexts
        .par_iter()
        .map(|context| evaluate(expr, context))
        .collect()
}
