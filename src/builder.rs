//! Builder pattern API for evaluation
//!
//! Provides a fluent interface for configuring and executing evaluation.
//!
//! # Example
//! ```
//! use symb_mapper::{Context, EvalError, Evaluate, Expr, Value};
//!
//! let expr = Expr::quotient(Expr::variable("x"), Expr::int(4));
//! let ctx = Context::new().bind("x", Value::Int(2));
//!
//! let half = Evaluate::new().to_float().max_depth(8).evaluate(&expr, &ctx);
//! assert_eq!(half, Ok(Value::Float(0.5)));
//!
//! let tight = Evaluate::new().max_nodes(2).evaluate(&expr, &ctx);
//! assert_eq!(tight, Err(EvalError::MaxNodesExceeded));
//! ```

use std::sync::Arc;

use crate::core::mapper::Mapper;
use crate::evaluator::{Context, EvalError, EvaluationMapper, Exact, ToFloat};
use crate::traits::ValueOps;
use crate::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, Expr};

/// Builder for evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluate {
    float: bool,
    max_depth: Option<usize>,
    max_nodes: Option<usize>,
}

impl Evaluate {
    /// Create a new evaluation builder: exact constants, no limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with `DEFAULT_MAX_DEPTH` and `DEFAULT_MAX_NODES` applied
    pub fn with_limits() -> Self {
        Self::new()
            .max_depth(DEFAULT_MAX_DEPTH)
            .max_nodes(DEFAULT_MAX_NODES)
    }

    /// Enable or disable float coercion of constants and rationals
    pub fn float(mut self, float: bool) -> Self {
        self.float = float;
        self
    }

    /// Shorthand for `float(true)`
    pub fn to_float(self) -> Self {
        self.float(true)
    }

    /// Set maximum expression depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set maximum expression node count
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    /// Reject `expr` if it exceeds the configured limits
    pub fn check_limits<E>(&self, expr: &Expr) -> Result<(), EvalError<E>> {
        if let Some(max_d) = self.max_depth
            && expr.max_depth() > max_d
        {
            return Err(EvalError::MaxDepthExceeded);
        }
        if let Some(max_n) = self.max_nodes
            && expr.node_count() > max_n
        {
            return Err(EvalError::MaxNodesExceeded);
        }
        Ok(())
    }

    /// Evaluate an expression under `context`
    #[tracing::instrument(level = "debug", skip_all, fields(float = self.float))]
    pub fn evaluate<V: ValueOps>(
        &self,
        expr: &Expr,
        context: &Context<'_, V>,
    ) -> Result<V, EvalError<V::Error>> {
        self.check_limits::<V::Error>(expr)?;
        if self.float {
            EvaluationMapper::<V, ToFloat>::new(context).rec(expr)
        } else {
            EvaluationMapper::<V, Exact>::new(context).rec(expr)
        }
    }

    /// Evaluate with bindings given as `(name, value)` pairs
    pub fn evaluate_kw<V, K, I>(&self, expr: &Expr, bindings: I) -> Result<V, EvalError<V::Error>>
    where
        V: ValueOps,
        K: Into<Arc<str>>,
        I: IntoIterator<Item = (K, V)>,
    {
        let context: Context<V> = bindings.into_iter().collect();
        self.evaluate(expr, &context)
    }
}
