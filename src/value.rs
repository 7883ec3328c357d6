//! Reference value model
//!
//! [`Value`] is the runtime type the evaluator produces when no host type is
//! plugged in. Numbers follow the promotion ladder
//! `Int < Rational < Float < Complex`: a binary operation lifts both operands
//! to the wider of the two kinds before computing. Integer arithmetic is
//! checked and reports [`ValueError::Overflow`] instead of wrapping, and exact
//! rationals collapse back to `Int` whenever their denominator is one.

use num_complex::Complex64;
use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul, Zero};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::Number;
use crate::traits::ValueOps;

// =============================================================================
// ERRORS
// =============================================================================

/// Failures raised by operations on [`Value`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Division, floor division or remainder by zero
    DivisionByZero,
    /// Operator applied to operands it does not support
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    /// Checked integer arithmetic overflowed
    Overflow { op: &'static str },
    /// Sequence or array index outside the valid range
    IndexOutOfRange { index: i64, len: usize },
    /// Subscript applied to a value without elements
    NotIndexable { type_name: &'static str },
    /// Attribute lookup failed
    NoAttribute {
        type_name: &'static str,
        name: String,
    },
    /// Call applied to a non-function
    NotCallable { type_name: &'static str },
    /// Function called with the wrong number of arguments
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },
    /// Comparison between values without a total order
    Unordered {
        lhs: &'static str,
        rhs: &'static str,
    },
    /// `Min`/`Max` over no operands
    EmptyReduction { op: &'static str },
    /// Array cell count does not match its shape
    ShapeMismatch { expected: usize, got: usize },
    /// A real number was required
    NotReal { type_name: &'static str },
    /// Operation not available for this kind of value
    Unsupported {
        op: &'static str,
        type_name: &'static str,
    },
    /// Failure reported by a native function
    Custom(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::DivisionByZero => write!(f, "Division by zero"),
            ValueError::TypeMismatch { op, lhs, rhs } => {
                write!(
                    f,
                    "Unsupported operand types for '{}': '{}' and '{}'",
                    op, lhs, rhs
                )
            }
            ValueError::Overflow { op } => write!(f, "Integer overflow in '{}'", op),
            ValueError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            ValueError::NotIndexable { type_name } => {
                write!(f, "Value of type '{}' is not indexable", type_name)
            }
            ValueError::NoAttribute { type_name, name } => {
                write!(f, "Value of type '{}' has no attribute '{}'", type_name, name)
            }
            ValueError::NotCallable { type_name } => {
                write!(f, "Value of type '{}' is not callable", type_name)
            }
            ValueError::Arity {
                function,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Function '{}' expects {} arguments, got {}",
                    function, expected, got
                )
            }
            ValueError::Unordered { lhs, rhs } => {
                write!(f, "Cannot order values of type '{}' and '{}'", lhs, rhs)
            }
            ValueError::EmptyReduction { op } => {
                write!(f, "'{}' requires at least one operand", op)
            }
            ValueError::ShapeMismatch { expected, got } => {
                write!(
                    f,
                    "Array shape requires {} cells, but {} were given",
                    expected, got
                )
            }
            ValueError::NotReal { type_name } => {
                write!(f, "Expected a real number, got '{}'", type_name)
            }
            ValueError::Unsupported { op, type_name } => {
                write!(f, "'{}' is not supported for '{}'", op, type_name)
            }
            ValueError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ValueError {}

// =============================================================================
// NATIVE FUNCTIONS
// =============================================================================

/// Host function body
pub type NativeFnBody = Arc<dyn Fn(&[Value]) -> Result<Value, ValueError> + Send + Sync>;

/// A named host function callable from `Call` nodes
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    arity: Option<usize>,
    body: NativeFnBody,
}

impl NativeFn {
    /// Variadic function
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ValueError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity: None,
            body: Arc::new(body),
        }
    }

    /// Function that checks its argument count before running
    pub fn with_arity<F>(name: impl Into<Arc<str>>, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ValueError> + Send + Sync + 'static,
    {
        Self {
            arity: Some(arity),
            ..Self::new(name, body)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Run the body after checking arity
    pub fn invoke(&self, args: &[Value]) -> Result<Value, ValueError> {
        if let Some(expected) = self.arity
            && expected != args.len()
        {
            return Err(ValueError::Arity {
                function: self.name.to_string(),
                expected,
                got: args.len(),
            });
        }
        (self.body)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

// =============================================================================
// DENSE ARRAYS
// =============================================================================

/// Dense n-dimensional array of values, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    cells: Vec<Value>,
}

impl NdArray {
    pub fn new(shape: Vec<usize>, cells: Vec<Value>) -> Result<Self, ValueError> {
        let expected = shape.iter().product::<usize>();
        if expected != cells.len() {
            return Err(ValueError::ShapeMismatch {
                expected,
                got: cells.len(),
            });
        }
        Ok(Self { shape, cells })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Cell at a full multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Option<&Value> {
        if index.len() != self.shape.len() {
            return None;
        }
        let offset = index
            .iter()
            .zip(&self.shape)
            .try_fold(0usize, |acc, (&i, &dim)| (i < dim).then_some(acc * dim + i))?;
        self.cells.get(offset)
    }

    /// Index along the first axis: a cell for 1-d arrays, a sub-array otherwise
    fn take(&self, index: i64) -> Result<Value, ValueError> {
        let len = self.shape.first().copied().unwrap_or(0);
        let row = normalize_index(index, len)?;
        if self.shape.len() == 1 {
            return Ok(self.cells[row].clone());
        }
        let stride = self.cells.len() / len;
        Ok(Value::Array(NdArray {
            shape: self.shape[1..].to_vec(),
            cells: self.cells[row * stride..(row + 1) * stride].to_vec(),
        }))
    }
}

/// Resolve a possibly negative index against `len`
fn normalize_index(index: i64, len: usize) -> Result<usize, ValueError> {
    let out_of_range = || ValueError::IndexOutOfRange { index, len };
    let resolved = if index < 0 {
        i64::try_from(len)
            .ok()
            .and_then(|len| len.checked_add(index))
            .ok_or_else(out_of_range)?
    } else {
        index
    };
    usize::try_from(resolved)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(out_of_range)
}

// =============================================================================
// VALUE
// =============================================================================

/// Runtime value produced by evaluation
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Complex(Complex64),
    /// Exact ratio with a denominator other than one
    Rational(Rational64),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Array(NdArray),
    /// Named fields, reachable through `Lookup`
    Record(Arc<FxHashMap<String, Value>>),
    Function(NativeFn),
}

impl Value {
    /// Short name of the value's type, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Rational(_) => "rational",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
        }
    }

    /// Build a record from `(field, value)` pairs
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Record(Arc::new(map))
    }

    /// Wrap a host closure as a variadic function value
    pub fn function<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ValueError> + Send + Sync + 'static,
    {
        Value::Function(NativeFn::new(name, body))
    }

    /// Exact ratio `numer / denom`, collapsed to `Int` when integral
    pub fn ratio(numer: i64, denom: i64) -> Result<Self, ValueError> {
        if denom == 0 {
            return Err(ValueError::DivisionByZero);
        }
        let (numer, denom) = if denom < 0 {
            numer
                .checked_neg()
                .zip(denom.checked_neg())
                .ok_or(ValueError::Overflow { op: "/" })?
        } else {
            (numer, denom)
        };
        Ok(collapse(Rational64::new(numer, denom)))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Real numeric value as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Rational(r) => Some(rational_to_f64(r)),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn rank(&self) -> Option<Rank> {
        match self {
            Value::Int(_) => Some(Rank::Int),
            Value::Rational(_) => Some(Rank::Rational),
            Value::Float(_) => Some(Rank::Float),
            Value::Complex(_) => Some(Rank::Complex),
            _ => None,
        }
    }

    fn as_rational(&self) -> Option<Rational64> {
        match self {
            Value::Int(n) => Some(Rational64::from_integer(*n)),
            Value::Rational(r) => Some(*r),
            _ => None,
        }
    }

    fn as_complex(&self) -> Option<Complex64> {
        match self {
            Value::Complex(c) => Some(*c),
            other => other.as_f64().map(|re| Complex64::new(re, 0.0)),
        }
    }

    fn is_numeric_zero(&self) -> bool {
        match self {
            Value::Int(n) => *n == 0,
            Value::Rational(r) => r.is_zero(),
            Value::Float(f) => *f == 0.0,
            Value::Complex(c) => c.is_zero(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<Rational64> for Value {
    fn from(r: Rational64) -> Self {
        collapse(r)
    }
}

impl From<NativeFn> for Value {
    fn from(f: NativeFn) -> Self {
        Value::Function(f)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => Value::Int(n),
            Number::Float(f) => Value::Float(f),
            Number::Complex(c) => Value::Complex(c),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Complex(c) => write!(f, "({})", c),
            Value::Rational(r) => write!(f, "{}", r),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Array(array) => {
                write!(f, "array(shape={:?}, [", array.shape)?;
                write_seq(f, &array.cells)?;
                write!(f, "])")
            }
            Value::Record(fields) => {
                let mut keys: Vec<&String> = fields.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, fields[key])?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}

// =============================================================================
// NUMERIC PROMOTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Int,
    Rational,
    Float,
    Complex,
}

/// Both operands lifted to their common numeric kind
enum Pair {
    Int(i64, i64),
    Rational(Rational64, Rational64),
    Float(f64, f64),
    Complex(Complex64, Complex64),
}

impl Pair {
    fn of(op: &'static str, lhs: &Value, rhs: &Value) -> Result<Self, ValueError> {
        let mismatch = || ValueError::TypeMismatch {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        };
        let rank = lhs
            .rank()
            .zip(rhs.rank())
            .map(|(a, b)| a.max(b))
            .ok_or_else(mismatch)?;
        let pair = match rank {
            Rank::Int => lhs.as_int().zip(rhs.as_int()).map(|(a, b)| Pair::Int(a, b)),
            Rank::Rational => lhs
                .as_rational()
                .zip(rhs.as_rational())
                .map(|(a, b)| Pair::Rational(a, b)),
            Rank::Float => lhs
                .as_f64()
                .zip(rhs.as_f64())
                .map(|(a, b)| Pair::Float(a, b)),
            Rank::Complex => lhs
                .as_complex()
                .zip(rhs.as_complex())
                .map(|(a, b)| Pair::Complex(a, b)),
        };
        pair.ok_or_else(mismatch)
    }
}

fn collapse(r: Rational64) -> Value {
    if r.is_integer() {
        Value::Int(r.to_integer())
    } else {
        Value::Rational(r)
    }
}

/// Reciprocal of a nonzero ratio, keeping the denominator positive
fn checked_recip(r: &Rational64) -> Option<Rational64> {
    let (numer, denom) = (*r.numer(), *r.denom());
    if numer < 0 {
        Some(Rational64::new_raw(denom.checked_neg()?, numer.checked_neg()?))
    } else {
        Some(Rational64::new_raw(denom, numer))
    }
}

fn checked_quotient(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    a.checked_mul(&checked_recip(b)?)
}

fn checked_floor_div(a: &Rational64, b: &Rational64) -> Option<i64> {
    let q = checked_quotient(a, b)?;
    q.numer().checked_div_euclid(*q.denom())
}

/// `a mod b` over the common denominator; the sign follows `b`
fn checked_floor_rem(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    let (n1, d1) = (*a.numer(), *a.denom());
    let (n2, d2) = (*b.numer(), *b.denom());
    let x = n1.checked_mul(d2)?;
    let y = n2.checked_mul(d1)?;
    let r = x.checked_rem_euclid(y)?;
    let r = if y < 0 && r != 0 { r + y } else { r };
    Some(Rational64::new(r, d1.checked_mul(d2)?))
}

fn rational_to_f64(r: &Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

/// Remainder whose sign follows the divisor
fn floor_rem_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn rational_pow(base: Rational64, exponent: i64) -> Result<Value, ValueError> {
    let overflow = || ValueError::Overflow { op: "**" };
    let magnitude = u32::try_from(exponent.unsigned_abs()).map_err(|_| overflow())?;
    let numer = base.numer().checked_pow(magnitude).ok_or_else(overflow)?;
    let denom = base.denom().checked_pow(magnitude).ok_or_else(overflow)?;
    if exponent >= 0 {
        Value::ratio(numer, denom)
    } else {
        Value::ratio(denom, numer)
    }
}

fn float_pow(base: f64, exponent: f64) -> Value {
    if base < 0.0 && exponent.fract() != 0.0 {
        Value::Complex(Complex64::new(base, 0.0).powf(exponent))
    } else {
        Value::Float(base.powf(exponent))
    }
}

fn concat(mut lhs: Vec<Value>, rhs: Vec<Value>) -> Vec<Value> {
    lhs.extend(rhs);
    lhs
}

// =============================================================================
// VALUE OPERATIONS
// =============================================================================

impl ValueOps for Value {
    type Error = ValueError;

    fn from_number(number: &Number) -> Result<Self, ValueError> {
        Ok(Value::from(*number))
    }

    fn to_float(self) -> Result<Self, ValueError> {
        match self {
            Value::Float(_) => Ok(self),
            Value::Complex(c) if c.im == 0.0 => Ok(Value::Float(c.re)),
            Value::Complex(_) => Err(ValueError::NotReal { type_name: "complex" }),
            other => other.as_f64().map(Value::Float).ok_or(ValueError::Unsupported {
                op: "float",
                type_name: other.type_name(),
            }),
        }
    }

    fn zero() -> Self {
        Value::Int(0)
    }

    fn one() -> Self {
        Value::Int(1)
    }

    fn try_add(self, rhs: Self) -> Result<Self, ValueError> {
        match (self, rhs) {
            (Value::List(a), Value::List(b)) => Ok(Value::List(concat(a, b))),
            (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(concat(a, b))),
            (lhs, rhs) => match Pair::of("+", &lhs, &rhs)? {
                Pair::Int(a, b) => a
                    .checked_add(b)
                    .map(Value::Int)
                    .ok_or(ValueError::Overflow { op: "+" }),
                Pair::Rational(a, b) => a
                    .checked_add(&b)
                    .map(collapse)
                    .ok_or(ValueError::Overflow { op: "+" }),
                Pair::Float(a, b) => Ok(Value::Float(a + b)),
                Pair::Complex(a, b) => Ok(Value::Complex(a + b)),
            },
        }
    }

    fn try_mul(self, rhs: Self) -> Result<Self, ValueError> {
        match Pair::of("*", &self, &rhs)? {
            Pair::Int(a, b) => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow { op: "*" }),
            Pair::Rational(a, b) => a
                .checked_mul(&b)
                .map(collapse)
                .ok_or(ValueError::Overflow { op: "*" }),
            Pair::Float(a, b) => Ok(Value::Float(a * b)),
            Pair::Complex(a, b) => Ok(Value::Complex(a * b)),
        }
    }

    fn try_div(self, rhs: Self) -> Result<Self, ValueError> {
        let pair = Pair::of("/", &self, &rhs)?;
        if rhs.is_numeric_zero() {
            return Err(ValueError::DivisionByZero);
        }
        match pair {
            Pair::Int(a, b) => Ok(Value::Float(a as f64 / b as f64)),
            Pair::Rational(a, b) => checked_quotient(&a, &b)
                .map(collapse)
                .ok_or(ValueError::Overflow { op: "/" }),
            Pair::Float(a, b) => Ok(Value::Float(a / b)),
            Pair::Complex(a, b) => Ok(Value::Complex(a / b)),
        }
    }

    fn try_floor_div(self, rhs: Self) -> Result<Self, ValueError> {
        let pair = Pair::of("//", &self, &rhs)?;
        if rhs.is_numeric_zero() {
            return Err(ValueError::DivisionByZero);
        }
        match pair {
            Pair::Int(a, b) => {
                let q = a.checked_div(b).ok_or(ValueError::Overflow { op: "//" })?;
                if a % b != 0 && (a < 0) != (b < 0) {
                    Ok(Value::Int(q - 1))
                } else {
                    Ok(Value::Int(q))
                }
            }
            Pair::Rational(a, b) => checked_floor_div(&a, &b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow { op: "//" }),
            Pair::Float(a, b) => Ok(Value::Float((a / b).floor())),
            Pair::Complex(..) => Err(ValueError::TypeMismatch {
                op: "//",
                lhs: self.type_name(),
                rhs: rhs.type_name(),
            }),
        }
    }

    fn try_rem(self, rhs: Self) -> Result<Self, ValueError> {
        let pair = Pair::of("%", &self, &rhs)?;
        if rhs.is_numeric_zero() {
            return Err(ValueError::DivisionByZero);
        }
        match pair {
            Pair::Int(a, b) => {
                let r = a.checked_rem(b).ok_or(ValueError::Overflow { op: "%" })?;
                if r != 0 && (r < 0) != (b < 0) {
                    Ok(Value::Int(r + b))
                } else {
                    Ok(Value::Int(r))
                }
            }
            Pair::Rational(a, b) => checked_floor_rem(&a, &b)
                .map(collapse)
                .ok_or(ValueError::Overflow { op: "%" }),
            Pair::Float(a, b) => Ok(Value::Float(floor_rem_f64(a, b))),
            Pair::Complex(..) => Err(ValueError::TypeMismatch {
                op: "%",
                lhs: self.type_name(),
                rhs: rhs.type_name(),
            }),
        }
    }

    fn try_pow(self, exponent: Self) -> Result<Self, ValueError> {
        let pair = Pair::of("**", &self, &exponent)?;
        let negative_exponent = exponent.as_f64().is_some_and(|e| e < 0.0);
        if self.is_numeric_zero() && negative_exponent {
            return Err(ValueError::DivisionByZero);
        }
        match pair {
            Pair::Int(a, b) if b >= 0 => {
                let overflow = || ValueError::Overflow { op: "**" };
                let b = u32::try_from(b).map_err(|_| overflow())?;
                a.checked_pow(b).map(Value::Int).ok_or_else(overflow)
            }
            Pair::Int(a, b) => Ok(Value::Float((a as f64).powf(b as f64))),
            Pair::Rational(a, b) if b.is_integer() => rational_pow(a, b.to_integer()),
            Pair::Rational(a, b) => Ok(float_pow(rational_to_f64(&a), rational_to_f64(&b))),
            Pair::Float(a, b) => Ok(float_pow(a, b)),
            Pair::Complex(a, b) => Ok(Value::Complex(a.powc(b))),
        }
    }

    fn exact_ratio(self, rhs: Self) -> Result<Self, ValueError> {
        match (self.as_rational(), rhs.as_rational()) {
            (Some(a), Some(b)) => {
                if b.is_zero() {
                    return Err(ValueError::DivisionByZero);
                }
                checked_quotient(&a, &b)
                    .map(collapse)
                    .ok_or(ValueError::Overflow { op: "/" })
            }
            _ => self.try_div(rhs),
        }
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ValueError> {
        let unordered = || ValueError::Unordered {
            lhs: self.type_name(),
            rhs: other.type_name(),
        };
        match Pair::of("<", self, other).map_err(|_| unordered())? {
            Pair::Int(a, b) => Ok(a.cmp(&b)),
            Pair::Rational(a, b) => Ok(a.cmp(&b)),
            Pair::Float(a, b) => a.partial_cmp(&b).ok_or_else(unordered),
            Pair::Complex(..) => Err(unordered()),
        }
    }

    fn is_positive(&self) -> Result<bool, ValueError> {
        Ok(self.compare(&Value::Int(0))? == Ordering::Greater)
    }

    fn index(&self, index: &Self) -> Result<Self, ValueError> {
        match (self, index) {
            (Value::List(items) | Value::Tuple(items), Value::Int(i)) => {
                Ok(items[normalize_index(*i, items.len())?].clone())
            }
            (Value::Array(array), Value::Int(i)) => array.take(*i),
            (Value::Array(_), Value::Tuple(axes)) => axes
                .iter()
                .try_fold(self.clone(), |current, axis| current.index(axis)),
            (Value::List(_) | Value::Tuple(_) | Value::Array(_), other) => {
                Err(ValueError::TypeMismatch {
                    op: "[]",
                    lhs: self.type_name(),
                    rhs: other.type_name(),
                })
            }
            _ => Err(ValueError::NotIndexable {
                type_name: self.type_name(),
            }),
        }
    }

    fn attribute(&self, name: &str) -> Result<Self, ValueError> {
        let found = match (self, name) {
            (Value::Record(fields), _) => fields.get(name).cloned(),
            (Value::Complex(c), "real") => Some(Value::Float(c.re)),
            (Value::Complex(c), "imag") => Some(Value::Float(c.im)),
            (Value::Rational(r), "numerator") => Some(Value::Int(*r.numer())),
            (Value::Rational(r), "denominator") => Some(Value::Int(*r.denom())),
            (Value::Array(a), "shape") => Some(Value::Tuple(
                a.shape
                    .iter()
                    .map(|&d| Value::Int(d as i64))
                    .collect(),
            )),
            (Value::Array(a), "size") => Some(Value::Int(a.cells.len() as i64)),
            (Value::Array(a), "ndim") => Some(Value::Int(a.shape.len() as i64)),
            _ => None,
        };
        found.ok_or_else(|| ValueError::NoAttribute {
            type_name: self.type_name(),
            name: name.to_string(),
        })
    }

    fn call(&self, args: Vec<Self>) -> Result<Self, ValueError> {
        match self {
            Value::Function(func) => func.invoke(&args),
            other => Err(ValueError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    fn list(items: Vec<Self>) -> Result<Self, ValueError> {
        Ok(Value::List(items))
    }

    fn tuple(items: Vec<Self>) -> Result<Self, ValueError> {
        Ok(Value::Tuple(items))
    }

    fn array(shape: Vec<usize>, cells: Vec<Self>) -> Result<Self, ValueError> {
        NdArray::new(shape, cells).map(Value::Array)
    }

    fn empty_reduction(op: &'static str) -> ValueError {
        ValueError::EmptyReduction { op }
    }
}
