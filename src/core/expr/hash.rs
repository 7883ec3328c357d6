//! Structural hashing for expression nodes.
//!
//! Children contribute their cached hashes, so hashing a freshly built node is
//! O(number of direct children) rather than O(tree size).

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{Expr, ExprKind, Number};

/// Compute the structural hash of a node kind.
pub fn compute_expr_hash(kind: &ExprKind) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    hasher.finish()
}

fn hash_children<H: Hasher>(children: &[Arc<Expr>], state: &mut H) {
    children.len().hash(state);
    for child in children {
        child.hash.hash(state);
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Number::Int(n) => n.hash(state),
            Number::Float(f) => f.to_bits().hash(state),
            Number::Complex(c) => {
                c.re.to_bits().hash(state);
                c.im.to_bits().hash(state);
            }
        }
    }
}

impl Hash for ExprKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Constant(n) => n.hash(state),
            Self::Variable(name) => name.hash(state),
            Self::Call {
                function,
                parameters,
            } => {
                function.hash.hash(state);
                hash_children(parameters, state);
            }
            Self::Subscript { aggregate, index } => {
                aggregate.hash.hash(state);
                index.hash.hash(state);
            }
            Self::Lookup { aggregate, name } => {
                aggregate.hash.hash(state);
                name.hash(state);
            }
            Self::Sum(children)
            | Self::Product(children)
            | Self::List(children)
            | Self::Min(children)
            | Self::Max(children)
            | Self::Tuple(children) => hash_children(children, state),
            Self::Quotient {
                numerator,
                denominator,
            }
            | Self::FloorDiv {
                numerator,
                denominator,
            }
            | Self::Remainder {
                numerator,
                denominator,
            }
            | Self::Rational {
                numerator,
                denominator,
            } => {
                numerator.hash.hash(state);
                denominator.hash.hash(state);
            }
            Self::Power { base, exponent } => {
                base.hash.hash(state);
                exponent.hash.hash(state);
            }
            Self::Polynomial(poly) => {
                poly.base().hash.hash(state);
                for (exponent, coeff) in poly.terms() {
                    exponent.hash(state);
                    coeff.hash.hash(state);
                }
            }
            Self::Array(array) => {
                array.shape.hash(state);
                hash_children(&array.elements, state);
            }
            Self::CommonSubexpression(child) => child.hash.hash(state),
            Self::Conditional {
                criterion,
                then,
                otherwise,
            } => {
                criterion.hash.hash(state);
                then.hash.hash(state);
                otherwise.hash.hash(state);
            }
            Self::Substitution {
                child,
                variables,
                values,
            } => {
                child.hash.hash(state);
                variables.hash(state);
                hash_children(values, state);
            }
            Self::Derivative { child, variables } => {
                child.hash.hash(state);
                variables.hash(state);
            }
        }
    }
}
