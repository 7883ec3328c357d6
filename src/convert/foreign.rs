//! Foreign expression trees as seen by the converter

use std::fmt;
use std::sync::Arc;

use super::ConvertError;

/// A node of an externally defined expression vocabulary.
///
/// The converter only ever reads a node through this trait: its type
/// identity, its positional arguments and its named fields.
pub trait ForeignNode: fmt::Debug + Send + Sync {
    /// Runtime type name, e.g. `"Add"` or `"sin"`
    fn type_name(&self) -> &str;

    /// Ancestor type names, most specific first, excluding the node's own type
    fn ancestors(&self) -> &[&'static str] {
        &[]
    }

    /// Positional arguments
    fn args(&self) -> &[ForeignExpr] {
        &[]
    }

    /// Named accessor, e.g. `"base"` on a power node
    fn field(&self, name: &str) -> Option<Field<'_>>;

    /// Whether the node is an application of a named function
    fn is_function(&self) -> bool {
        false
    }
}

/// Value of a named accessor
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Expr(&'a ForeignExpr),
    List(&'a [ForeignExpr]),
    Text(&'a str),
}

/// A position in a foreign tree: a literal host integer or a shared node
#[derive(Debug, Clone)]
pub enum ForeignExpr {
    Int(i64),
    Node(Arc<dyn ForeignNode>),
}

impl ForeignExpr {
    /// Wrap a node
    pub fn node(node: impl ForeignNode + 'static) -> Self {
        ForeignExpr::Node(Arc::new(node))
    }

    pub fn type_name(&self) -> &str {
        match self {
            ForeignExpr::Int(_) => "int",
            ForeignExpr::Node(node) => node.type_name(),
        }
    }

    /// The node's type followed by its ancestors, most specific first
    pub fn lineage(&self) -> impl Iterator<Item = &str> + '_ {
        let ancestors: &[&'static str] = match self {
            ForeignExpr::Int(_) => &[],
            ForeignExpr::Node(node) => node.ancestors(),
        };
        std::iter::once(self.type_name()).chain(ancestors.iter().copied())
    }

    pub fn args(&self) -> &[ForeignExpr] {
        match self {
            ForeignExpr::Int(_) => &[],
            ForeignExpr::Node(node) => node.args(),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, ForeignExpr::Node(node) if node.is_function())
    }

    fn field(&self, name: &'static str) -> Result<Field<'_>, ConvertError> {
        let found = match self {
            ForeignExpr::Int(_) => None,
            ForeignExpr::Node(node) => node.field(name),
        };
        found.ok_or_else(|| self.missing(name))
    }

    fn missing(&self, field: &'static str) -> ConvertError {
        ConvertError::MissingField {
            type_name: self.type_name().to_string(),
            field,
        }
    }

    /// Named accessor holding a single subtree
    pub fn expr_field(&self, name: &'static str) -> Result<&ForeignExpr, ConvertError> {
        match self.field(name)? {
            Field::Expr(expr) => Ok(expr),
            _ => Err(self.missing(name)),
        }
    }

    /// Named accessor holding a sequence of subtrees
    pub fn list_field(&self, name: &'static str) -> Result<&[ForeignExpr], ConvertError> {
        match self.field(name)? {
            Field::List(items) => Ok(items),
            _ => Err(self.missing(name)),
        }
    }

    /// Named accessor holding text
    pub fn text_field(&self, name: &'static str) -> Result<&str, ConvertError> {
        match self.field(name)? {
            Field::Text(text) => Ok(text),
            _ => Err(self.missing(name)),
        }
    }
}

impl From<i64> for ForeignExpr {
    fn from(n: i64) -> Self {
        ForeignExpr::Int(n)
    }
}
