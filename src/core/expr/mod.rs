//! Expression tree for symbolic mappers.
//!
//! This module defines:
//! - `Expr` - the immutable expression node
//! - `ExprKind` - the closed vocabulary of node kinds
//! - `Number` - literal constants carried by `ExprKind::Constant`
//! - `ArrayExpr` - a rectangular array whose cells are expressions
//!
//! # Architecture
//!
//! ## Structural sharing
//! Children are held in `Arc<Expr>`. A subtree referenced from several places
//! (for instance through `CommonSubexpression` wrappers) is stored once, and no
//! node is ever mutated after construction.
//!
//! ## Structural hashing
//! Each `Expr` carries a pre-computed `hash` of its kind and its children's
//! hashes. Equality first rejects on hash mismatch and only then compares
//! structure, which keeps cache lookups keyed by subtrees cheap.
//!
//! # Usage
//!
//! ```
//! use symb_mapper::Expr;
//!
//! let x = Expr::variable("x");
//! let expr = Expr::sum([Expr::power(x.clone(), Expr::int(2)), x]);
//! assert_eq!(expr.node_count(), 5);
//! ```

mod analysis;
mod constructors;
mod hash;

use num_complex::Complex64;
use std::ops::Deref;
use std::sync::Arc;

use crate::core::poly::Polynomial;

pub use hash::compute_expr_hash;

/// Cached leaf used during `Drop` to swap out children without allocation
pub(crate) static DUMMY_ARC: std::sync::LazyLock<Arc<Expr>> =
    std::sync::LazyLock::new(|| Arc::new(Expr::new(ExprKind::Constant(Number::Int(0)))));

// =============================================================================
// NUMBER - literal constants
// =============================================================================

/// A literal constant stored in the tree.
///
/// Equality is bitwise for floating-point payloads so that `Expr` can be used
/// as a hash-map key (`NaN` equals itself, `0.0` and `-0.0` differ).
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Machine integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Complex number with double-precision parts
    Complex(Complex64),
}

impl Number {
    /// The imaginary unit `i`
    pub const I: Number = Number::Complex(Complex64::new(0.0, 1.0));

    /// Check if this constant is numerically one (`1`, `1.0` or `1+0i`)
    pub fn is_one(&self) -> bool {
        match self {
            Number::Int(n) => *n == 1,
            Number::Float(f) => *f == 1.0,
            Number::Complex(c) => c.re == 1.0 && c.im == 0.0,
        }
    }

    /// Short name of the constant's numeric type
    pub fn type_name(&self) -> &'static str {
        match self {
            Number::Int(_) => "int",
            Number::Float(_) => "float",
            Number::Complex(_) => "complex",
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            (Number::Complex(a), Number::Complex(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            _ => false,
        }
    }
}

impl Eq for Number {}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Int(i64::from(n))
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

impl From<Complex64> for Number {
    fn from(c: Complex64) -> Self {
        Number::Complex(c)
    }
}

// =============================================================================
// EXPR - the node type
// =============================================================================

/// An immutable symbolic expression node.
///
/// Build nodes with the constructors on `Expr` (`Expr::sum`, `Expr::power`, ...)
/// and walk them with a [`Mapper`](crate::Mapper).
#[derive(Debug, Clone)]
pub struct Expr {
    /// Structural hash for O(1) equality rejection
    pub(crate) hash: u64,
    /// The kind of expression (structure)
    pub(crate) kind: ExprKind,
}

impl Deref for Expr {
    type Target = ExprKind;
    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl PartialEq for Expr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl std::hash::Hash for Expr {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

// =============================================================================
// ARRAYEXPR - rectangular arrays of expressions
// =============================================================================

/// A rectangular array of expressions stored in row-major order.
///
/// Invariant: `elements.len()` equals the product of `shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub(crate) shape: Vec<usize>,
    pub(crate) elements: Vec<Arc<Expr>>,
}

impl ArrayExpr {
    /// Dimensions of the array
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Cells in row-major order (last axis fastest-varying)
    pub fn elements(&self) -> &[Arc<Expr>] {
        &self.elements
    }

    /// Cell at a multi-dimensional index, if in bounds
    pub fn get(&self, index: &[usize]) -> Option<&Arc<Expr>> {
        if index.len() != self.shape.len() {
            return None;
        }
        let offset = index
            .iter()
            .zip(&self.shape)
            .try_fold(0usize, |acc, (&i, &dim)| (i < dim).then_some(acc * dim + i))?;
        self.elements.get(offset)
    }
}

// =============================================================================
// EXPRKIND - the closed vocabulary
// =============================================================================

/// The kind (structure) of an expression node.
///
/// The vocabulary is closed: every [`Mapper`](crate::Mapper) has one handler
/// per variant, checked by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal constant
    Constant(Number),

    /// Named variable, resolved against an evaluation context
    Variable(Arc<str>),

    /// Application of `function` to `parameters`
    Call {
        function: Arc<Expr>,
        parameters: Vec<Arc<Expr>>,
    },

    /// `aggregate[index]`
    Subscript {
        aggregate: Arc<Expr>,
        index: Arc<Expr>,
    },

    /// Attribute access `aggregate.name`
    Lookup { aggregate: Arc<Expr>, name: Arc<str> },

    /// N-ary sum; the empty sum is the additive identity
    Sum(Vec<Arc<Expr>>),

    /// N-ary product; the empty product is the multiplicative identity
    Product(Vec<Arc<Expr>>),

    /// True (non-truncating) division
    Quotient {
        numerator: Arc<Expr>,
        denominator: Arc<Expr>,
    },

    /// Floor division
    FloorDiv {
        numerator: Arc<Expr>,
        denominator: Arc<Expr>,
    },

    /// Modulo matching floor division
    Remainder {
        numerator: Arc<Expr>,
        denominator: Arc<Expr>,
    },

    /// Exponentiation
    Power { base: Arc<Expr>, exponent: Arc<Expr> },

    /// Exact ratio of two expressions
    Rational {
        numerator: Arc<Expr>,
        denominator: Arc<Expr>,
    },

    /// Univariate polynomial in `base` with sparse, descending terms
    Polynomial(Polynomial),

    /// Ordered sequence
    List(Vec<Arc<Expr>>),

    /// Rectangular array of expressions
    Array(ArrayExpr),

    /// Marks a subtree that is evaluated at most once per top-level call
    CommonSubexpression(Arc<Expr>),

    /// `then` if `criterion > 0`, otherwise `otherwise`
    Conditional {
        criterion: Arc<Expr>,
        then: Arc<Expr>,
        otherwise: Arc<Expr>,
    },

    /// Minimum of the children
    Min(Vec<Arc<Expr>>),

    /// Maximum of the children
    Max(Vec<Arc<Expr>>),

    /// Fixed-length ordered aggregate
    Tuple(Vec<Arc<Expr>>),

    /// `child` with `variables[i]` replaced by `values[i]`
    Substitution {
        child: Arc<Expr>,
        variables: Vec<Arc<str>>,
        values: Vec<Arc<Expr>>,
    },

    /// Derivative of `child` with respect to `variables`, in order
    Derivative {
        child: Arc<Expr>,
        variables: Vec<Arc<str>>,
    },
}

impl ExprKind {
    /// Name of the node kind, as used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprKind::Constant(_) => "Constant",
            ExprKind::Variable(_) => "Variable",
            ExprKind::Call { .. } => "Call",
            ExprKind::Subscript { .. } => "Subscript",
            ExprKind::Lookup { .. } => "Lookup",
            ExprKind::Sum(_) => "Sum",
            ExprKind::Product(_) => "Product",
            ExprKind::Quotient { .. } => "Quotient",
            ExprKind::FloorDiv { .. } => "FloorDiv",
            ExprKind::Remainder { .. } => "Remainder",
            ExprKind::Power { .. } => "Power",
            ExprKind::Rational { .. } => "Rational",
            ExprKind::Polynomial(_) => "Polynomial",
            ExprKind::List(_) => "List",
            ExprKind::Array(_) => "Array",
            ExprKind::CommonSubexpression(_) => "CommonSubexpression",
            ExprKind::Conditional { .. } => "Conditional",
            ExprKind::Min(_) => "Min",
            ExprKind::Max(_) => "Max",
            ExprKind::Tuple(_) => "Tuple",
            ExprKind::Substitution { .. } => "Substitution",
            ExprKind::Derivative { .. } => "Derivative",
        }
    }
}

// =============================================================================
// DROP IMPLEMENTATION - Iterative drop to prevent stack overflow
// =============================================================================

impl Drop for Expr {
    fn drop(&mut self) {
        fn take_arc(slot: &mut Arc<Expr>, queue: &mut Vec<Arc<Expr>>) {
            queue.push(std::mem::replace(slot, Arc::clone(&DUMMY_ARC)));
        }

        fn drain_children(kind: &mut ExprKind, queue: &mut Vec<Arc<Expr>>) {
            match kind {
                ExprKind::Constant(_) | ExprKind::Variable(_) => {}
                ExprKind::Call {
                    function,
                    parameters,
                } => {
                    take_arc(function, queue);
                    queue.extend(std::mem::take(parameters));
                }
                ExprKind::Subscript { aggregate, index } => {
                    take_arc(aggregate, queue);
                    take_arc(index, queue);
                }
                ExprKind::Lookup { aggregate, .. } => take_arc(aggregate, queue),
                ExprKind::Sum(children)
                | ExprKind::Product(children)
                | ExprKind::List(children)
                | ExprKind::Min(children)
                | ExprKind::Max(children)
                | ExprKind::Tuple(children) => {
                    queue.extend(std::mem::take(children));
                }
                ExprKind::Quotient {
                    numerator,
                    denominator,
                }
                | ExprKind::FloorDiv {
                    numerator,
                    denominator,
                }
                | ExprKind::Remainder {
                    numerator,
                    denominator,
                }
                | ExprKind::Rational {
                    numerator,
                    denominator,
                } => {
                    take_arc(numerator, queue);
                    take_arc(denominator, queue);
                }
                ExprKind::Power { base, exponent } => {
                    take_arc(base, queue);
                    take_arc(exponent, queue);
                }
                ExprKind::Polynomial(poly) => poly.drain_into(queue),
                ExprKind::Array(array) => {
                    queue.extend(std::mem::take(&mut array.elements));
                }
                ExprKind::CommonSubexpression(child) | ExprKind::Derivative { child, .. } => {
                    take_arc(child, queue);
                }
                ExprKind::Conditional {
                    criterion,
                    then,
                    otherwise,
                } => {
                    take_arc(criterion, queue);
                    take_arc(then, queue);
                    take_arc(otherwise, queue);
                }
                ExprKind::Substitution { child, values, .. } => {
                    take_arc(child, queue);
                    queue.extend(std::mem::take(values));
                }
            }
        }

        let mut work_queue = Vec::new();
        drain_children(&mut self.kind, &mut work_queue);

        while let Some(child_arc) = work_queue.pop() {
            if let Ok(mut child_expr) = Arc::try_unwrap(child_arc) {
                drain_children(&mut child_expr.kind, &mut work_queue);
            }
        }
    }
}
