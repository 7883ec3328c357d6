//! Core types for symbolic mappers
//!
//! This module contains the fundamental types:
//! - `Expr` / `ExprKind` / `Number` - Expression tree
//! - `Polynomial` - Sparse univariate polynomial node
//! - `ExprError` - Construction errors
//! - `Mapper` - Recursive mapper protocol and stock mappers

pub(crate) mod error;
pub(crate) mod expr;
pub mod mapper; // Public mapper protocol
pub(crate) mod poly;

// Public re-exports (for external API)
pub use error::ExprError;
pub use expr::{ArrayExpr, Expr, ExprKind, Number};
pub use mapper::{DepthMeter, Mapper, NodeCounter, VariableCollector, dispatch};
pub use poly::Polynomial;
