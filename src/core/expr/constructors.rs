//! Expression constructors.
//!
//! Provides all constructor methods for building expressions. Children may be
//! passed either as owned `Expr` values or as shared `Arc<Expr>` handles; the
//! latter lets one subtree appear in several places without copying.

use std::sync::Arc;

use super::{ArrayExpr, Expr, ExprKind, Number, compute_expr_hash};
use crate::core::error::ExprError;
use crate::core::poly::Polynomial;

fn collect_children<I>(children: I) -> Vec<Arc<Expr>>
where
    I: IntoIterator,
    I::Item: Into<Arc<Expr>>,
{
    children.into_iter().map(Into::into).collect()
}

impl Expr {
    /// Create a new expression, computing its structural hash
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        let hash = compute_expr_hash(&kind);
        Self { hash, kind }
    }

    /// Get the structural hash of the expression
    #[inline]
    #[must_use]
    pub const fn structural_hash(&self) -> u64 {
        self.hash
    }

    /// Borrow the node's kind
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    // -------------------------------------------------------------------------
    // Accessor methods
    // -------------------------------------------------------------------------

    /// Return the constant if this node is one
    #[inline]
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Number> {
        match &self.kind {
            ExprKind::Constant(n) => Some(n),
            _ => None,
        }
    }

    /// Return the variable name if this node is one
    #[inline]
    #[must_use]
    pub fn as_variable(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Check if this node is a constant equal to one
    #[inline]
    #[must_use]
    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(Number::is_one)
    }

    // -------------------------------------------------------------------------
    // Leaves
    // -------------------------------------------------------------------------

    /// Create a constant node
    pub fn constant(value: impl Into<Number>) -> Self {
        Expr::new(ExprKind::Constant(value.into()))
    }

    /// Create an integer constant
    pub fn int(n: i64) -> Self {
        Expr::constant(Number::Int(n))
    }

    /// Create a floating-point constant
    pub fn float(f: f64) -> Self {
        Expr::constant(Number::Float(f))
    }

    /// Create a variable reference
    pub fn variable(name: impl Into<Arc<str>>) -> Self {
        Expr::new(ExprKind::Variable(name.into()))
    }

    // -------------------------------------------------------------------------
    // Access and application
    // -------------------------------------------------------------------------

    /// Apply `function` to `parameters`
    ///
    /// # Example
    /// ```
    /// use symb_mapper::Expr;
    ///
    /// let call = Expr::call(Expr::variable("f"), [Expr::variable("x"), Expr::int(2)]);
    /// assert_eq!(call.kind().kind_name(), "Call");
    /// ```
    pub fn call<I>(function: impl Into<Arc<Expr>>, parameters: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Call {
            function: function.into(),
            parameters: collect_children(parameters),
        })
    }

    /// Create `aggregate[index]`
    pub fn subscript(aggregate: impl Into<Arc<Expr>>, index: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::Subscript {
            aggregate: aggregate.into(),
            index: index.into(),
        })
    }

    /// Create the attribute access `aggregate.name`
    pub fn lookup(aggregate: impl Into<Arc<Expr>>, name: impl Into<Arc<str>>) -> Self {
        Expr::new(ExprKind::Lookup {
            aggregate: aggregate.into(),
            name: name.into(),
        })
    }

    // -------------------------------------------------------------------------
    // Arithmetic
    // -------------------------------------------------------------------------

    /// Create an N-ary sum. No flattening or reordering is performed.
    pub fn sum<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Sum(collect_children(children)))
    }

    /// Create an N-ary product. No flattening or reordering is performed.
    pub fn product<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Product(collect_children(children)))
    }

    /// Create a true division
    pub fn quotient(numerator: impl Into<Arc<Expr>>, denominator: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::Quotient {
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    /// Create a floor division
    pub fn floor_div(numerator: impl Into<Arc<Expr>>, denominator: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::FloorDiv {
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    /// Create a remainder (modulo matching floor division)
    pub fn remainder(numerator: impl Into<Arc<Expr>>, denominator: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::Remainder {
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    /// Create `base ** exponent`
    pub fn power(base: impl Into<Arc<Expr>>, exponent: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::Power {
            base: base.into(),
            exponent: exponent.into(),
        })
    }

    /// Create an exact ratio
    pub fn rational(numerator: impl Into<Arc<Expr>>, denominator: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::Rational {
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    /// Create a polynomial node from `(exponent, coefficient)` terms.
    ///
    /// Terms must be non-empty and listed with strictly decreasing exponents.
    ///
    /// # Example
    /// ```
    /// use symb_mapper::Expr;
    ///
    /// // 3x^2 + 1
    /// let p = Expr::polynomial(Expr::variable("x"), [(2, Expr::int(3)), (0, Expr::int(1))]);
    /// assert!(p.is_ok());
    /// ```
    pub fn polynomial<I, C>(base: impl Into<Arc<Expr>>, terms: I) -> Result<Self, ExprError>
    where
        I: IntoIterator<Item = (u32, C)>,
        C: Into<Arc<Expr>>,
    {
        Ok(Expr::new(ExprKind::Polynomial(Polynomial::new(
            base, terms,
        )?)))
    }

    // -------------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------------

    /// Create an ordered list
    pub fn list<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::List(collect_children(children)))
    }

    /// Create a tuple
    pub fn tuple<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Tuple(collect_children(children)))
    }

    /// Create a rectangular array from row-major cells
    pub fn array<I>(shape: impl Into<Vec<usize>>, elements: I) -> Result<Self, ExprError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        let shape = shape.into();
        let elements = collect_children(elements);
        let expected: usize = shape.iter().product();
        if elements.len() != expected {
            return Err(ExprError::ShapeMismatch {
                expected,
                got: elements.len(),
            });
        }
        Ok(Expr::new(ExprKind::Array(ArrayExpr { shape, elements })))
    }

    // -------------------------------------------------------------------------
    // Control and selection
    // -------------------------------------------------------------------------

    /// Mark `child` as a common subexpression
    pub fn common_subexpression(child: impl Into<Arc<Expr>>) -> Self {
        Expr::new(ExprKind::CommonSubexpression(child.into()))
    }

    /// Create `then if criterion > 0 else otherwise`
    pub fn conditional(
        criterion: impl Into<Arc<Expr>>,
        then: impl Into<Arc<Expr>>,
        otherwise: impl Into<Arc<Expr>>,
    ) -> Self {
        Expr::new(ExprKind::Conditional {
            criterion: criterion.into(),
            then: then.into(),
            otherwise: otherwise.into(),
        })
    }

    /// Create a minimum over the children
    pub fn min<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Min(collect_children(children)))
    }

    /// Create a maximum over the children
    pub fn max<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Expr>>,
    {
        Expr::new(ExprKind::Max(collect_children(children)))
    }

    // -------------------------------------------------------------------------
    // Calculus notation
    // -------------------------------------------------------------------------

    /// Create `child` with each of `variables` replaced by the matching value
    pub fn substitution<N, V>(
        child: impl Into<Arc<Expr>>,
        variables: N,
        values: V,
    ) -> Result<Self, ExprError>
    where
        N: IntoIterator,
        N::Item: Into<Arc<str>>,
        V: IntoIterator,
        V::Item: Into<Arc<Expr>>,
    {
        let variables: Vec<Arc<str>> = variables.into_iter().map(Into::into).collect();
        let values = collect_children(values);
        if variables.len() != values.len() {
            return Err(ExprError::SubstitutionArity {
                variables: variables.len(),
                values: values.len(),
            });
        }
        Ok(Expr::new(ExprKind::Substitution {
            child: child.into(),
            variables,
            values,
        }))
    }

    /// Create the derivative of `child` with respect to `variables`
    pub fn derivative<N>(child: impl Into<Arc<Expr>>, variables: N) -> Self
    where
        N: IntoIterator,
        N::Item: Into<Arc<str>>,
    {
        Expr::new(ExprKind::Derivative {
            child: child.into(),
            variables: variables.into_iter().map(Into::into).collect(),
        })
    }
}

impl From<Number> for Expr {
    fn from(n: Number) -> Self {
        Expr::constant(n)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::int(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Expr::float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_shape_checked() {
        let ok = Expr::array([2usize, 2], (0..4).map(Expr::int));
        assert!(ok.is_ok());

        let bad = Expr::array([2usize, 3], (0..4).map(Expr::int));
        assert_eq!(
            bad.err(),
            Some(ExprError::ShapeMismatch {
                expected: 6,
                got: 4
            })
        );
    }

    #[test]
    fn test_substitution_arity_checked() {
        let res = Expr::substitution(Expr::variable("x"), ["x", "y"], [Expr::int(1)]);
        assert!(matches!(
            res,
            Err(ExprError::SubstitutionArity {
                variables: 2,
                values: 1
            })
        ));
    }

    #[test]
    fn test_shared_children_are_not_copied() {
        let shared = Arc::new(Expr::variable("x"));
        let expr = Expr::sum([Arc::clone(&shared), Arc::clone(&shared)]);
        match expr.kind() {
            ExprKind::Sum(children) => {
                assert!(Arc::ptr_eq(&children[0], &children[1]));
            }
            other => panic!("expected Sum, got {:?}", other),
        }
    }

    #[test]
    fn test_is_one() {
        assert!(Expr::int(1).is_one());
        assert!(Expr::float(1.0).is_one());
        assert!(!Expr::int(2).is_one());
        assert!(!Expr::variable("one").is_one());
    }
}
