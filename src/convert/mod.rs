//! Conversion from foreign expression trees.
//!
//! A foreign vocabulary is open: new node types may appear at any time and
//! form an inheritance hierarchy. The [`Converter`] therefore dispatches
//! through a registry keyed by type name, probing the node's lineage from the
//! most specific type to the least specific one. Supporting a new foreign type
//! means registering a handler; the dispatch core never changes.
//!
//! When no handler matches, a literal integer becomes a constant, a function
//! application becomes a [`Call`](crate::ExprKind::Call) of a variable named
//! after the function, and anything else is rejected with
//! [`ConvertError::UnsupportedNode`].

mod foreign;
mod handlers;

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

pub use foreign::{Field, ForeignExpr, ForeignNode};

use crate::{Expr, ExprError};

/// Errors raised while converting a foreign tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// No handler, literal or function fallback applies
    UnsupportedNode { converter: String, type_name: String },
    /// A handler could not read a documented accessor
    MissingField {
        type_name: String,
        field: &'static str,
    },
    /// The converted parts do not form a valid expression
    Expr(ExprError),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::UnsupportedNode {
                converter,
                type_name,
            } => {
                write!(
                    f,
                    "{} does not know how to map type '{}'",
                    converter, type_name
                )
            }
            ConvertError::MissingField { type_name, field } => {
                write!(f, "Node of type '{}' has no field '{}'", type_name, field)
            }
            ConvertError::Expr(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Expr(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExprError> for ConvertError {
    fn from(err: ExprError) -> Self {
        ConvertError::Expr(err)
    }
}

/// Converts one foreign node; recurse into children through the converter
pub type Handler = fn(&Converter, &ForeignExpr) -> Result<Expr, ConvertError>;

/// Default handler table, built once
static DEFAULT_HANDLERS: OnceLock<FxHashMap<&'static str, Handler>> = OnceLock::new();

/// Translates foreign trees into [`Expr`] trees
///
/// # Example
/// ```
/// use symb_mapper::{Converter, Expr, ForeignExpr};
///
/// let converter = Converter::new();
/// assert_eq!(converter.convert(&ForeignExpr::Int(7)), Ok(Expr::int(7)));
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    name: &'static str,
    handlers: FxHashMap<&'static str, Handler>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Converter with the default handlers for the common algebra vocabulary
    pub fn new() -> Self {
        Self {
            name: "Converter",
            handlers: DEFAULT_HANDLERS.get_or_init(handlers::defaults).clone(),
        }
    }

    /// Converter without any handlers; only the fallbacks apply
    pub fn empty() -> Self {
        Self {
            name: "Converter",
            handlers: FxHashMap::default(),
        }
    }

    /// Set the name used in error messages
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add or replace the handler for `type_name`, returning the previous one
    pub fn register(&mut self, type_name: &'static str, handler: Handler) -> Option<Handler> {
        self.handlers.insert(type_name, handler)
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_handler(mut self, type_name: &'static str, handler: Handler) -> Self {
        self.register(type_name, handler);
        self
    }

    /// Whether a handler is registered for exactly `type_name`
    pub fn handles(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    /// Convert a whole foreign tree
    #[tracing::instrument(level = "debug", skip_all, fields(converter = self.name, root = node.type_name()))]
    pub fn convert(&self, node: &ForeignExpr) -> Result<Expr, ConvertError> {
        self.rec(node)
    }

    /// Convert one node, dispatching on the first type in its lineage that
    /// has a handler
    pub fn rec(&self, node: &ForeignExpr) -> Result<Expr, ConvertError> {
        for type_name in node.lineage() {
            if let Some(handler) = self.handlers.get(type_name) {
                tracing::trace!(node = node.type_name(), handler = type_name, "dispatch");
                return handler(self, node);
            }
        }
        self.not_supported(node)
    }

    /// Convert a sequence of nodes in order
    pub fn rec_all(&self, nodes: &[ForeignExpr]) -> Result<Vec<Expr>, ConvertError> {
        nodes.iter().map(|node| self.rec(node)).collect()
    }

    /// Fallback for nodes without a handler
    fn not_supported(&self, node: &ForeignExpr) -> Result<Expr, ConvertError> {
        match node {
            ForeignExpr::Int(n) => Ok(Expr::int(*n)),
            _ if node.is_function() => {
                tracing::debug!(function = node.type_name(), "converting unknown function to a call");
                let args = self.rec_all(node.args())?;
                Ok(Expr::call(Expr::variable(node.type_name()), args))
            }
            _ => Err(ConvertError::UnsupportedNode {
                converter: self.name.to_string(),
                type_name: node.type_name().to_string(),
            }),
        }
    }
}
