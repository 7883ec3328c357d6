//! Recursive mappers over symbolic expression trees
//!
//! A small, focused Rust library for walking immutable expression trees.
//!
//! # Features
//! - Closed expression vocabulary with structural hashing and sharing
//! - A [`Mapper`] protocol with one compile-checked handler per node kind
//! - Numeric evaluation generic over the value model, with a float variant
//! - Conversion from open, foreign expression vocabularies by lineage dispatch
//! - **Builder pattern API** for evaluation limits and coercion
//!
//! # Usage Examples
//!
//! ## Evaluation
//! ```
//! use symb_mapper::{Context, Expr, Value, evaluate};
//!
//! let x = Expr::variable("x");
//! let poly = Expr::polynomial(x, [(2, Expr::int(3)), (0, Expr::int(-1))]).unwrap();
//! let ctx = Context::new().bind("x", Value::Int(2));
//! assert_eq!(evaluate(&poly, &ctx), Ok(Value::Int(11)));
//! ```
//!
//! ## Writing a mapper
//! ```
//! use symb_mapper::{Expr, Mapper, VariableCollector};
//!
//! let expr = Expr::product([Expr::variable("a"), Expr::variable("b")]);
//! let mut collector = VariableCollector::default();
//! let Ok(()) = collector.rec(&expr);
//! assert_eq!(collector.variables.len(), 2);
//! ```

mod builder;
mod convert;
mod core;
mod evaluator;
pub mod traits;
mod value;

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use builder::Evaluate;
pub use convert::{ConvertError, Converter, Field, ForeignExpr, ForeignNode, Handler};
pub use crate::core::expr::compute_expr_hash;
pub use crate::core::mapper;
pub use crate::core::{
    ArrayExpr, DepthMeter, Expr, ExprError, ExprKind, Mapper, NodeCounter, Number, Polynomial,
    VariableCollector, dispatch,
};
pub use evaluator::{
    Coercion, Context, EvalError, EvaluationMapper, Exact, FloatEvaluationMapper, ToFloat,
    evaluate, evaluate_kw, evaluate_to_float,
};
pub use traits::ValueOps;
pub use value::{NativeFn, NativeFnBody, NdArray, Value, ValueError};

/// Default maximum expression depth
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum expression node count
pub const DEFAULT_MAX_NODES: usize = 10_000;
