use std::fmt;

/// Errors raised while constructing malformed expression nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A polynomial needs at least one term
    EmptyPolynomial,
    /// Polynomial exponents must be strictly decreasing
    NonDecreasingExponents { previous: u32, next: u32 },
    /// Array cell count does not match the product of its shape
    ShapeMismatch { expected: usize, got: usize },
    /// Substitution names and values differ in length
    SubstitutionArity { variables: usize, values: usize },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::EmptyPolynomial => write!(f, "Polynomial must have at least one term"),
            ExprError::NonDecreasingExponents { previous, next } => {
                write!(
                    f,
                    "Polynomial exponents must be strictly decreasing, but {} is followed by {}",
                    previous, next
                )
            }
            ExprError::ShapeMismatch { expected, got } => {
                write!(
                    f,
                    "Array shape requires {} elements, but {} were given",
                    expected, got
                )
            }
            ExprError::SubstitutionArity { variables, values } => {
                write!(
                    f,
                    "Substitution binds {} variables but provides {} values",
                    variables, values
                )
            }
        }
    }
}

impl std::error::Error for ExprError {}
