//! Recursive mapper protocol for expression trees
//!
//! A [`Mapper`] has one `map_<kind>` handler per [`ExprKind`] variant and a
//! `rec` entry point that dispatches on the node's kind. Handlers for
//! composite nodes call `rec` on each child and combine the children's
//! results; they never look inside a child directly.
//!
//! Every operation that consumes a tree (evaluation, differentiation,
//! printing, code generation) implements this trait. Because the handlers are
//! required trait methods and dispatch is an exhaustive `match`, forgetting a
//! node kind is a compile error rather than a runtime fallback.
//!
//! # Example
//! ```
//! use std::convert::Infallible;
//! use symb_mapper::{Expr, Mapper, NodeCounter};
//!
//! let x = Expr::variable("x");
//! let expr = Expr::sum([Expr::power(x.clone(), Expr::int(2)), x]);
//! assert_eq!(NodeCounter::default().rec(&expr), Ok::<usize, Infallible>(5));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use std::convert::Infallible;
use std::sync::Arc;

use crate::core::expr::{ArrayExpr, Expr, ExprKind, Number};
use crate::core::poly::Polynomial;

/// Trait for recursive operations over expression trees
///
/// `Output` is the per-node result and `Error` the failure type; an
/// infallible mapper uses [`Infallible`].
pub trait Mapper {
    /// Result produced for each node
    type Output;
    /// Failure that aborts the walk
    type Error;

    /// Dispatch `expr` to the handler for its kind
    fn rec(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        dispatch(self, expr)
    }

    /// Map every child in order, stopping at the first failure
    fn rec_all(&mut self, children: &[Arc<Expr>]) -> Result<Vec<Self::Output>, Self::Error> {
        children.iter().map(|child| self.rec(child)).collect()
    }

    fn map_constant(&mut self, value: &Number) -> Result<Self::Output, Self::Error>;

    fn map_variable(&mut self, name: &str) -> Result<Self::Output, Self::Error>;

    fn map_call(
        &mut self,
        function: &Expr,
        parameters: &[Arc<Expr>],
    ) -> Result<Self::Output, Self::Error>;

    fn map_subscript(&mut self, aggregate: &Expr, index: &Expr)
    -> Result<Self::Output, Self::Error>;

    fn map_lookup(&mut self, aggregate: &Expr, name: &str) -> Result<Self::Output, Self::Error>;

    fn map_sum(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_product(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_quotient(
        &mut self,
        numerator: &Expr,
        denominator: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn map_floor_div(
        &mut self,
        numerator: &Expr,
        denominator: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn map_remainder(
        &mut self,
        numerator: &Expr,
        denominator: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn map_power(&mut self, base: &Expr, exponent: &Expr) -> Result<Self::Output, Self::Error>;

    fn map_rational(
        &mut self,
        numerator: &Expr,
        denominator: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn map_polynomial(&mut self, poly: &Polynomial) -> Result<Self::Output, Self::Error>;

    fn map_list(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_array(&mut self, array: &ArrayExpr) -> Result<Self::Output, Self::Error>;

    /// `child` is handed over as the shared handle so that mappers can key
    /// caches on it.
    fn map_common_subexpression(&mut self, child: &Arc<Expr>)
    -> Result<Self::Output, Self::Error>;

    fn map_conditional(
        &mut self,
        criterion: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn map_min(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_max(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_tuple(&mut self, children: &[Arc<Expr>]) -> Result<Self::Output, Self::Error>;

    fn map_substitution(
        &mut self,
        child: &Expr,
        variables: &[Arc<str>],
        values: &[Arc<Expr>],
    ) -> Result<Self::Output, Self::Error>;

    fn map_derivative(
        &mut self,
        child: &Expr,
        variables: &[Arc<str>],
    ) -> Result<Self::Output, Self::Error>;
}

/// Select the handler for `expr`'s kind and invoke it
pub fn dispatch<M: Mapper + ?Sized>(mapper: &mut M, expr: &Expr) -> Result<M::Output, M::Error> {
    match &expr.kind {
        ExprKind::Constant(value) => mapper.map_constant(value),
        ExprKind::Variable(name) => mapper.map_variable(name),
        ExprKind::Call {
            function,
            parameters,
        } => mapper.map_call(function, parameters),
        ExprKind::Subscript { aggregate, index } => mapper.map_subscript(aggregate, index),
        ExprKind::Lookup { aggregate, name } => mapper.map_lookup(aggregate, name),
        ExprKind::Sum(children) => mapper.map_sum(children),
        ExprKind::Product(children) => mapper.map_product(children),
        ExprKind::Quotient {
            numerator,
            denominator,
        } => mapper.map_quotient(numerator, denominator),
        ExprKind::FloorDiv {
            numerator,
            denominator,
        } => mapper.map_floor_div(numerator, denominator),
        ExprKind::Remainder {
            numerator,
            denominator,
        } => mapper.map_remainder(numerator, denominator),
        ExprKind::Power { base, exponent } => mapper.map_power(base, exponent),
        ExprKind::Rational {
            numerator,
            denominator,
        } => mapper.map_rational(numerator, denominator),
        ExprKind::Polynomial(poly) => mapper.map_polynomial(poly),
        ExprKind::List(children) => mapper.map_list(children),
        ExprKind::Array(array) => mapper.map_array(array),
        ExprKind::CommonSubexpression(child) => mapper.map_common_subexpression(child),
        ExprKind::Conditional {
            criterion,
            then,
            otherwise,
        } => mapper.map_conditional(criterion, then, otherwise),
        ExprKind::Min(children) => mapper.map_min(children),
        ExprKind::Max(children) => mapper.map_max(children),
        ExprKind::Tuple(children) => mapper.map_tuple(children),
        ExprKind::Substitution {
            child,
            variables,
            values,
        } => mapper.map_substitution(child, variables, values),
        ExprKind::Derivative { child, variables } => mapper.map_derivative(child, variables),
    }
}

// =============================================================================
// Stock mappers
// =============================================================================

/// Per-walk results keyed by node address
///
/// A subtree shared through several `Arc`s is measured once. The table is
/// cleared whenever a new top-level walk starts, so addresses from a tree
/// that has since been dropped are never consulted.
#[derive(Debug, Default, Clone)]
struct AddressMemo {
    seen: FxHashMap<usize, usize>,
    depth: usize,
}

impl AddressMemo {
    /// Cached result for `expr`, or the key to record its fresh result under
    fn enter(&mut self, expr: &Expr) -> Result<usize, usize> {
        if self.depth == 0 {
            self.seen.clear();
        }
        let key = std::ptr::from_ref(expr).addr();
        match self.seen.get(&key) {
            Some(&hit) => Ok(hit),
            None => {
                self.depth += 1;
                Err(key)
            }
        }
    }

    fn leave(&mut self, key: usize, result: usize) -> usize {
        self.depth -= 1;
        self.seen.insert(key, result);
        result
    }
}

/// `1 + sum(parts)`, saturating
fn one_plus<I: IntoIterator<Item = usize>>(parts: I) -> usize {
    parts.into_iter().fold(1, usize::saturating_add)
}

/// Counts the nodes of a tree, including polynomial coefficients and array cells
///
/// Shared subtrees count once per reference, like the tree they unfold into;
/// the count saturates at `usize::MAX`.
#[derive(Debug, Default, Clone)]
pub struct NodeCounter {
    memo: AddressMemo,
}

impl NodeCounter {
    fn children(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        Ok(one_plus(self.rec_all(children)?))
    }

    fn pair(&mut self, a: &Expr, b: &Expr) -> Result<usize, Infallible> {
        Ok(one_plus([self.rec(a)?, self.rec(b)?]))
    }
}

impl Mapper for NodeCounter {
    type Output = usize;
    type Error = Infallible;

    fn rec(&mut self, expr: &Expr) -> Result<usize, Infallible> {
        match self.memo.enter(expr) {
            Ok(count) => Ok(count),
            Err(key) => {
                let Ok(count) = dispatch(self, expr);
                Ok(self.memo.leave(key, count))
            }
        }
    }

    fn map_constant(&mut self, _value: &Number) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn map_variable(&mut self, _name: &str) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn map_call(&mut self, function: &Expr, parameters: &[Arc<Expr>]) -> Result<usize, Infallible> {
        Ok(self.rec(function)?.saturating_add(self.children(parameters)?))
    }

    fn map_subscript(&mut self, aggregate: &Expr, index: &Expr) -> Result<usize, Infallible> {
        self.pair(aggregate, index)
    }

    fn map_lookup(&mut self, aggregate: &Expr, _name: &str) -> Result<usize, Infallible> {
        Ok(one_plus([self.rec(aggregate)?]))
    }

    fn map_sum(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_product(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_quotient(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.pair(numerator, denominator)
    }

    fn map_floor_div(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.pair(numerator, denominator)
    }

    fn map_remainder(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.pair(numerator, denominator)
    }

    fn map_power(&mut self, base: &Expr, exponent: &Expr) -> Result<usize, Infallible> {
        self.pair(base, exponent)
    }

    fn map_rational(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.pair(numerator, denominator)
    }

    fn map_polynomial(&mut self, poly: &Polynomial) -> Result<usize, Infallible> {
        let mut count = one_plus([self.rec(poly.base())?]);
        for (_, coeff) in poly.terms() {
            count = count.saturating_add(self.rec(coeff)?);
        }
        Ok(count)
    }

    fn map_list(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_array(&mut self, array: &ArrayExpr) -> Result<usize, Infallible> {
        self.children(array.elements())
    }

    fn map_common_subexpression(&mut self, child: &Arc<Expr>) -> Result<usize, Infallible> {
        Ok(one_plus([self.rec(child)?]))
    }

    fn map_conditional(
        &mut self,
        criterion: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<usize, Infallible> {
        Ok(one_plus([self.rec(criterion)?, self.rec(then)?, self.rec(otherwise)?]))
    }

    fn map_min(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_max(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_tuple(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.children(children)
    }

    fn map_substitution(
        &mut self,
        child: &Expr,
        _variables: &[Arc<str>],
        values: &[Arc<Expr>],
    ) -> Result<usize, Infallible> {
        Ok(self.rec(child)?.saturating_add(self.children(values)?))
    }

    fn map_derivative(
        &mut self,
        child: &Expr,
        _variables: &[Arc<str>],
    ) -> Result<usize, Infallible> {
        Ok(one_plus([self.rec(child)?]))
    }
}

/// Measures the maximum nesting depth of a tree (a leaf has depth 1)
#[derive(Debug, Default, Clone)]
pub struct DepthMeter {
    memo: AddressMemo,
}

impl DepthMeter {
    fn deepest<'a, I>(&mut self, children: I) -> Result<usize, Infallible>
    where
        I: IntoIterator<Item = &'a Expr>,
    {
        let mut depth = 0;
        for child in children {
            depth = depth.max(self.rec(child)?);
        }
        Ok(1 + depth)
    }
}

impl Mapper for DepthMeter {
    type Output = usize;
    type Error = Infallible;

    fn rec(&mut self, expr: &Expr) -> Result<usize, Infallible> {
        match self.memo.enter(expr) {
            Ok(depth) => Ok(depth),
            Err(key) => {
                let Ok(depth) = dispatch(self, expr);
                Ok(self.memo.leave(key, depth))
            }
        }
    }

    fn map_constant(&mut self, _value: &Number) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn map_variable(&mut self, _name: &str) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn map_call(&mut self, function: &Expr, parameters: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(std::iter::once(function).chain(parameters.iter().map(Arc::as_ref)))
    }

    fn map_subscript(&mut self, aggregate: &Expr, index: &Expr) -> Result<usize, Infallible> {
        self.deepest([aggregate, index])
    }

    fn map_lookup(&mut self, aggregate: &Expr, _name: &str) -> Result<usize, Infallible> {
        self.deepest([aggregate])
    }

    fn map_sum(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_product(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_quotient(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.deepest([numerator, denominator])
    }

    fn map_floor_div(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.deepest([numerator, denominator])
    }

    fn map_remainder(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.deepest([numerator, denominator])
    }

    fn map_power(&mut self, base: &Expr, exponent: &Expr) -> Result<usize, Infallible> {
        self.deepest([base, exponent])
    }

    fn map_rational(&mut self, numerator: &Expr, denominator: &Expr) -> Result<usize, Infallible> {
        self.deepest([numerator, denominator])
    }

    fn map_polynomial(&mut self, poly: &Polynomial) -> Result<usize, Infallible> {
        let coeffs = poly.terms().iter().map(|(_, coeff)| Arc::as_ref(coeff));
        self.deepest(std::iter::once(Arc::as_ref(poly.base())).chain(coeffs))
    }

    fn map_list(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_array(&mut self, array: &ArrayExpr) -> Result<usize, Infallible> {
        self.deepest(array.elements().iter().map(Arc::as_ref))
    }

    fn map_common_subexpression(&mut self, child: &Arc<Expr>) -> Result<usize, Infallible> {
        self.deepest([Arc::as_ref(child)])
    }

    fn map_conditional(
        &mut self,
        criterion: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<usize, Infallible> {
        self.deepest([criterion, then, otherwise])
    }

    fn map_min(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_max(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_tuple(&mut self, children: &[Arc<Expr>]) -> Result<usize, Infallible> {
        self.deepest(children.iter().map(Arc::as_ref))
    }

    fn map_substitution(
        &mut self,
        child: &Expr,
        _variables: &[Arc<str>],
        values: &[Arc<Expr>],
    ) -> Result<usize, Infallible> {
        self.deepest(std::iter::once(child).chain(values.iter().map(Arc::as_ref)))
    }

    fn map_derivative(
        &mut self,
        child: &Expr,
        _variables: &[Arc<str>],
    ) -> Result<usize, Infallible> {
        self.deepest([child])
    }
}

/// Collects the free variable names of a tree
///
/// Names bound by a `Substitution` are not free inside its body. The
/// variables of a `Derivative` count as dependencies of the result.
#[derive(Debug, Default, Clone)]
pub struct VariableCollector {
    pub variables: FxHashSet<String>,
}

impl VariableCollector {
    fn each(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.rec_all(children).map(drop)
    }

    fn both(&mut self, a: &Expr, b: &Expr) -> Result<(), Infallible> {
        self.rec(a)?;
        self.rec(b)
    }
}

impl Mapper for VariableCollector {
    type Output = ();
    type Error = Infallible;

    fn map_constant(&mut self, _value: &Number) -> Result<(), Infallible> {
        Ok(())
    }

    fn map_variable(&mut self, name: &str) -> Result<(), Infallible> {
        self.variables.insert(name.to_string());
        Ok(())
    }

    fn map_call(&mut self, function: &Expr, parameters: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.rec(function)?;
        self.each(parameters)
    }

    fn map_subscript(&mut self, aggregate: &Expr, index: &Expr) -> Result<(), Infallible> {
        self.both(aggregate, index)
    }

    fn map_lookup(&mut self, aggregate: &Expr, _name: &str) -> Result<(), Infallible> {
        self.rec(aggregate)
    }

    fn map_sum(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_product(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_quotient(&mut self, numerator: &Expr, denominator: &Expr) -> Result<(), Infallible> {
        self.both(numerator, denominator)
    }

    fn map_floor_div(&mut self, numerator: &Expr, denominator: &Expr) -> Result<(), Infallible> {
        self.both(numerator, denominator)
    }

    fn map_remainder(&mut self, numerator: &Expr, denominator: &Expr) -> Result<(), Infallible> {
        self.both(numerator, denominator)
    }

    fn map_power(&mut self, base: &Expr, exponent: &Expr) -> Result<(), Infallible> {
        self.both(base, exponent)
    }

    fn map_rational(&mut self, numerator: &Expr, denominator: &Expr) -> Result<(), Infallible> {
        self.both(numerator, denominator)
    }

    fn map_polynomial(&mut self, poly: &Polynomial) -> Result<(), Infallible> {
        self.rec(poly.base())?;
        for (_, coeff) in poly.terms() {
            self.rec(coeff)?;
        }
        Ok(())
    }

    fn map_list(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_array(&mut self, array: &ArrayExpr) -> Result<(), Infallible> {
        self.each(array.elements())
    }

    fn map_common_subexpression(&mut self, child: &Arc<Expr>) -> Result<(), Infallible> {
        self.rec(child)
    }

    fn map_conditional(
        &mut self,
        criterion: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> Result<(), Infallible> {
        self.rec(criterion)?;
        self.both(then, otherwise)
    }

    fn map_min(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_max(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_tuple(&mut self, children: &[Arc<Expr>]) -> Result<(), Infallible> {
        self.each(children)
    }

    fn map_substitution(
        &mut self,
        child: &Expr,
        variables: &[Arc<str>],
        values: &[Arc<Expr>],
    ) -> Result<(), Infallible> {
        let mut body = VariableCollector::default();
        body.rec(child)?;
        for bound in variables {
            body.variables.remove(bound.as_ref());
        }
        self.variables.extend(body.variables);
        self.each(values)
    }

    fn map_derivative(&mut self, child: &Expr, variables: &[Arc<str>]) -> Result<(), Infallible> {
        self.variables
            .extend(variables.iter().map(|v| v.to_string()));
        self.rec(child)
    }
}
