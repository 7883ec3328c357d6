//! The evaluation mapper and its coercion policies

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Context, EvalError};
use crate::core::mapper::Mapper;
use crate::traits::ValueOps;
use crate::{ArrayExpr, Expr, Number, Polynomial};

/// How constants and exact ratios enter the value model.
///
/// This is the only point where the base and float evaluators differ; every
/// other handler is shared.
pub trait Coercion {
    fn constant<V: ValueOps>(number: &Number) -> Result<V, V::Error>;

    fn rational<V: ValueOps>(numerator: V, denominator: V) -> Result<V, V::Error>;
}

/// Constants are converted unchanged; rationals stay exact
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

/// Constants are coerced to floats; rationals become true division
#[derive(Debug, Clone, Copy, Default)]
pub struct ToFloat;

impl Coercion for Exact {
    fn constant<V: ValueOps>(number: &Number) -> Result<V, V::Error> {
        V::from_number(number)
    }

    fn rational<V: ValueOps>(numerator: V, denominator: V) -> Result<V, V::Error> {
        numerator.exact_ratio(denominator)
    }
}

impl Coercion for ToFloat {
    fn constant<V: ValueOps>(number: &Number) -> Result<V, V::Error> {
        V::from_number(number)?.to_float()
    }

    fn rational<V: ValueOps>(numerator: V, denominator: V) -> Result<V, V::Error> {
        numerator.try_div(denominator)
    }
}

/// Reduces an expression tree to a value under a [`Context`].
///
/// Each instance owns a cache for `CommonSubexpression` nodes, keyed by the
/// structure of the wrapped child, so a shared subtree is evaluated at most
/// once. Build a fresh mapper per top-level call.
#[derive(Debug)]
pub struct EvaluationMapper<'c, V, C = Exact> {
    context: &'c Context<'c, V>,
    cache: FxHashMap<Arc<Expr>, V>,
    _coercion: PhantomData<C>,
}

/// Evaluation mapper that produces host floats
pub type FloatEvaluationMapper<'c, V> = EvaluationMapper<'c, V, ToFloat>;

impl<'c, V: ValueOps, C: Coercion> EvaluationMapper<'c, V, C> {
    pub fn new(context: &'c Context<'c, V>) -> Self {
        Self {
            context,
            cache: FxHashMap::default(),
            _coercion: PhantomData,
        }
    }

    /// Number of cached common subexpressions
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Left fold with `op`; an empty sequence yields `identity`
    fn fold(
        &mut self,
        children: &[Arc<Expr>],
        identity: fn() -> V,
        op: fn(V, V) -> Result<V, V::Error>,
    ) -> Result<V, EvalError<V::Error>> {
        let Some((first, rest)) = children.split_first() else {
            return Ok(identity());
        };
        let mut acc = self.rec(first)?;
        for child in rest {
            acc = op(acc, self.rec(child)?)?;
        }
        Ok(acc)
    }

    /// Keep the child whose comparison against the current pick is `keep`
    fn extremum(
        &mut self,
        children: &[Arc<Expr>],
        op: &'static str,
        keep: Ordering,
    ) -> Result<V, EvalError<V::Error>> {
        let Some((first, rest)) = children.split_first() else {
            return Err(EvalError::Value(V::empty_reduction(op)));
        };
        let mut best = self.rec(first)?;
        for child in rest {
            let candidate = self.rec(child)?;
            if candidate.compare(&best)? == keep {
                best = candidate;
            }
        }
        Ok(best)
    }
}

impl<'c, V: ValueOps, C: Coercion> Mapper for EvaluationMapper<'c, V, C> {
    type Output = V;
    type Error = EvalError<V::Error>;

    fn map_constant(&mut self, value: &Number) -> Result<V, Self::Error> {
        Ok(C::constant::<V>(value)?)
    }

    fn map_variable(&mut self, name: &str) -> Result<V, Self::Error> {
        self.context
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string()))
    }

    fn map_call(&mut self, function: &Expr, parameters: &[Arc<Expr>]) -> Result<V, Self::Error> {
        let callee = self.rec(function)?;
        let args = self.rec_all(parameters)?;
        Ok(callee.call(args)?)
    }

    fn map_subscript(&mut self, aggregate: &Expr, index: &Expr) -> Result<V, Self::Error> {
        let aggregate = self.rec(aggregate)?;
        let index = self.rec(index)?;
        Ok(aggregate.index(&index)?)
    }

    fn map_lookup(&mut self, aggregate: &Expr, name: &str) -> Result<V, Self::Error> {
        Ok(self.rec(aggregate)?.attribute(name)?)
    }

    fn map_sum(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        self.fold(children, V::zero, V::try_add)
    }

    fn map_product(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        self.fold(children, V::one, V::try_mul)
    }

    fn map_quotient(&mut self, numerator: &Expr, denominator: &Expr) -> Result<V, Self::Error> {
        let n = self.rec(numerator)?;
        Ok(n.try_div(self.rec(denominator)?)?)
    }

    fn map_floor_div(&mut self, numerator: &Expr, denominator: &Expr) -> Result<V, Self::Error> {
        let n = self.rec(numerator)?;
        Ok(n.try_floor_div(self.rec(denominator)?)?)
    }

    fn map_remainder(&mut self, numerator: &Expr, denominator: &Expr) -> Result<V, Self::Error> {
        let n = self.rec(numerator)?;
        Ok(n.try_rem(self.rec(denominator)?)?)
    }

    fn map_power(&mut self, base: &Expr, exponent: &Expr) -> Result<V, Self::Error> {
        let b = self.rec(base)?;
        Ok(b.try_pow(self.rec(exponent)?)?)
    }

    fn map_rational(&mut self, numerator: &Expr, denominator: &Expr) -> Result<V, Self::Error> {
        let n = self.rec(numerator)?;
        Ok(C::rational(n, self.rec(denominator)?)?)
    }

    fn map_polynomial(&mut self, poly: &Polynomial) -> Result<V, Self::Error> {
        let base = self.rec(poly.base())?;
        let mut acc = V::zero();
        for (gap, coeff) in poly.horner_steps() {
            let gap = V::from_number(&Number::Int(i64::from(gap)))?;
            acc = acc
                .try_add(self.rec(coeff)?)?
                .try_mul(base.clone().try_pow(gap)?)?;
        }
        Ok(acc)
    }

    fn map_list(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        let items = self.rec_all(children)?;
        Ok(V::list(items)?)
    }

    fn map_array(&mut self, array: &ArrayExpr) -> Result<V, Self::Error> {
        let cells = self.rec_all(array.elements())?;
        Ok(V::array(array.shape().to_vec(), cells)?)
    }

    fn map_common_subexpression(&mut self, child: &Arc<Expr>) -> Result<V, Self::Error> {
        if let Some(value) = self.cache.get(child) {
            tracing::trace!(hash = child.structural_hash(), "common subexpression cache hit");
            return Ok(value.clone());
        }
        let value = self.rec(child)?;
        self.cache.insert(Arc::clone(child), value.clone());
        Ok(value)
    }

    fn map_conditional(
        &mut self,
        criterion: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<V, Self::Error> {
        if self.rec(criterion)?.is_positive()? {
            self.rec(then)
        } else {
            self.rec(otherwise)
        }
    }

    fn map_min(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        self.extremum(children, "min", Ordering::Less)
    }

    fn map_max(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        self.extremum(children, "max", Ordering::Greater)
    }

    fn map_tuple(&mut self, children: &[Arc<Expr>]) -> Result<V, Self::Error> {
        let items = self.rec_all(children)?;
        Ok(V::tuple(items)?)
    }

    fn map_substitution(
        &mut self,
        child: &Expr,
        variables: &[Arc<str>],
        values: &[Arc<Expr>],
    ) -> Result<V, Self::Error> {
        let values = self.rec_all(values)?;
        let mut scope = self.context.child();
        for (name, value) in variables.iter().zip(values) {
            scope.insert(Arc::clone(name), value);
        }
        EvaluationMapper::<V, C>::new(&scope).rec(child)
    }

    fn map_derivative(&mut self, _child: &Expr, _variables: &[Arc<str>]) -> Result<V, Self::Error> {
        Err(EvalError::NotEvaluable { kind: "Derivative" })
    }
}
