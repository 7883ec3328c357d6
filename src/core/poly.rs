//! Univariate polynomial node.
//!
//! A `Polynomial` stores a base expression and sparse `(exponent, coefficient)`
//! terms sorted by strictly decreasing exponent, e.g. `3x^5 + x^2 - 1` is
//! `[(5, 3), (2, 1), (0, -1)]` over base `x`. Coefficients are expressions in
//! their own right, so a mapper reaches them through `rec` like any other child.

use std::sync::Arc;

use crate::Expr;
use crate::core::error::ExprError;
use crate::core::expr::DUMMY_ARC;

/// Polynomial in a single base expression
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    base: Arc<Expr>,
    terms: Vec<(u32, Arc<Expr>)>,
}

impl Polynomial {
    /// Build a polynomial, checking that terms are non-empty and that exponents
    /// strictly decrease.
    pub fn new<I, C>(base: impl Into<Arc<Expr>>, terms: I) -> Result<Self, ExprError>
    where
        I: IntoIterator<Item = (u32, C)>,
        C: Into<Arc<Expr>>,
    {
        let terms: Vec<(u32, Arc<Expr>)> = terms
            .into_iter()
            .map(|(exponent, coeff)| (exponent, coeff.into()))
            .collect();

        if terms.is_empty() {
            return Err(ExprError::EmptyPolynomial);
        }
        if let Some(pair) = terms.windows(2).find(|pair| pair[0].0 <= pair[1].0) {
            return Err(ExprError::NonDecreasingExponents {
                previous: pair[0].0,
                next: pair[1].0,
            });
        }

        Ok(Polynomial {
            base: base.into(),
            terms,
        })
    }

    /// The expression the polynomial is evaluated in
    pub fn base(&self) -> &Arc<Expr> {
        &self.base
    }

    /// Terms in descending exponent order
    pub fn terms(&self) -> &[(u32, Arc<Expr>)] {
        &self.terms
    }

    /// Highest exponent
    pub fn degree(&self) -> u32 {
        self.terms[0].0
    }

    /// Coefficients paired with the exponent gap to the following term
    /// (or to zero, for the last term).
    ///
    /// Folding `acc = (acc + coeff) * base^gap` over these steps, starting from
    /// zero, yields `sum(coeff_i * base^exp_i)` (Horner's scheme).
    pub fn horner_steps(&self) -> impl Iterator<Item = (u32, &Arc<Expr>)> + '_ {
        self.terms.iter().enumerate().map(|(i, (exponent, coeff))| {
            let next = self.terms.get(i + 1).map_or(0, |(e, _)| *e);
            (exponent - next, coeff)
        })
    }

    /// Move all children into `queue` (used by the iterative `Drop` of `Expr`)
    pub(crate) fn drain_into(&mut self, queue: &mut Vec<Arc<Expr>>) {
        queue.extend(self.terms.drain(..).map(|(_, coeff)| coeff));
        let base = std::mem::replace(&mut self.base, Arc::clone(&DUMMY_ARC));
        queue.push(base);
    }
}
