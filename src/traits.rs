//! Value-model contract consumed by the evaluator
//!
//! The evaluator never performs arithmetic itself. Every operation on
//! intermediate results goes through [`ValueOps`], so the same mapper works
//! over the reference [`Value`](crate::Value) type, plain `f64`, or any host
//! numeric type a caller plugs in.

use num_traits::{One, Pow, Zero};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};

use crate::Number;
use crate::value::ValueError;

/// Operations the evaluator needs from a runtime value.
///
/// Every fallible operation reports failures through the associated `Error`,
/// which the evaluator carries unchanged inside
/// [`EvalError::Value`](crate::EvalError::Value).
pub trait ValueOps: Clone + Debug {
    /// Host failure type
    type Error: Debug + Display;

    /// Convert a tree constant into a value, unchanged
    fn from_number(number: &Number) -> Result<Self, Self::Error>;

    /// Coerce to the host floating-point representation
    fn to_float(self) -> Result<Self, Self::Error>;

    /// Additive identity (value of the empty sum)
    fn zero() -> Self;

    /// Multiplicative identity (value of the empty product)
    fn one() -> Self;

    fn try_add(self, rhs: Self) -> Result<Self, Self::Error>;

    fn try_mul(self, rhs: Self) -> Result<Self, Self::Error>;

    /// True (non-truncating) division
    fn try_div(self, rhs: Self) -> Result<Self, Self::Error>;

    /// Floor division
    fn try_floor_div(self, rhs: Self) -> Result<Self, Self::Error>;

    /// Modulo matching floor division; the sign follows the divisor
    fn try_rem(self, rhs: Self) -> Result<Self, Self::Error>;

    fn try_pow(self, exponent: Self) -> Result<Self, Self::Error>;

    /// Exact ratio. Types without an exact representation fall back to
    /// true division.
    fn exact_ratio(self, rhs: Self) -> Result<Self, Self::Error> {
        self.try_div(rhs)
    }

    /// Total order used by `Min`/`Max`
    fn compare(&self, other: &Self) -> Result<Ordering, Self::Error>;

    /// Whether the value is strictly greater than zero
    fn is_positive(&self) -> Result<bool, Self::Error>;

    /// `self[index]`
    fn index(&self, index: &Self) -> Result<Self, Self::Error>;

    /// `self.name`
    fn attribute(&self, name: &str) -> Result<Self, Self::Error>;

    /// Apply `self` as a function
    fn call(&self, args: Vec<Self>) -> Result<Self, Self::Error>;

    fn list(items: Vec<Self>) -> Result<Self, Self::Error>;

    fn tuple(items: Vec<Self>) -> Result<Self, Self::Error>;

    /// Dense array with row-major `cells`
    fn array(shape: Vec<usize>, cells: Vec<Self>) -> Result<Self, Self::Error>;

    /// Error reported when `op` is applied to no operands
    fn empty_reduction(op: &'static str) -> Self::Error;
}

/// Plain floating-point evaluation
///
/// Aggregates, attributes and calls are unsupported; everything else follows
/// IEEE semantics, except that a zero divisor (`/`, `//`, `%`) and zero raised
/// to a negative power report [`ValueError::DivisionByZero`], matching
/// [`Value`](crate::Value).
impl ValueOps for f64 {
    type Error = ValueError;

    fn from_number(number: &Number) -> Result<Self, ValueError> {
        match number {
            Number::Int(n) => Ok(*n as f64),
            Number::Float(f) => Ok(*f),
            Number::Complex(c) if c.im == 0.0 => Ok(c.re),
            Number::Complex(_) => Err(ValueError::NotReal { type_name: "complex" }),
        }
    }

    fn to_float(self) -> Result<Self, ValueError> {
        Ok(self)
    }

    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn try_add(self, rhs: Self) -> Result<Self, ValueError> {
        Ok(self + rhs)
    }

    fn try_mul(self, rhs: Self) -> Result<Self, ValueError> {
        Ok(self * rhs)
    }

    fn try_div(self, rhs: Self) -> Result<Self, ValueError> {
        if rhs.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        Ok(self / rhs)
    }

    fn try_floor_div(self, rhs: Self) -> Result<Self, ValueError> {
        Ok(self.try_div(rhs)?.floor())
    }

    fn try_rem(self, rhs: Self) -> Result<Self, ValueError> {
        if rhs.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        Ok(self - rhs * (self / rhs).floor())
    }

    fn try_pow(self, exponent: Self) -> Result<Self, ValueError> {
        if self.is_zero() && exponent < 0.0 {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Pow::pow(self, exponent))
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ValueError> {
        self.partial_cmp(other).ok_or(ValueError::Unordered {
            lhs: "float",
            rhs: "float",
        })
    }

    fn is_positive(&self) -> Result<bool, ValueError> {
        Ok(self.compare(&0.0)? == Ordering::Greater)
    }

    fn index(&self, _index: &Self) -> Result<Self, ValueError> {
        Err(ValueError::NotIndexable { type_name: "float" })
    }

    fn attribute(&self, name: &str) -> Result<Self, ValueError> {
        Err(ValueError::NoAttribute {
            type_name: "float",
            name: name.to_string(),
        })
    }

    fn call(&self, _args: Vec<Self>) -> Result<Self, ValueError> {
        Err(ValueError::NotCallable { type_name: "float" })
    }

    fn list(_items: Vec<Self>) -> Result<Self, ValueError> {
        Err(ValueError::Unsupported {
            op: "list",
            type_name: "float",
        })
    }

    fn tuple(_items: Vec<Self>) -> Result<Self, ValueError> {
        Err(ValueError::Unsupported {
            op: "tuple",
            type_name: "float",
        })
    }

    fn array(_shape: Vec<usize>, _cells: Vec<Self>) -> Result<Self, ValueError> {
        Err(ValueError::Unsupported {
            op: "array",
            type_name: "float",
        })
    }

    fn empty_reduction(op: &'static str) -> ValueError {
        ValueError::EmptyReduction { op }
    }
}
