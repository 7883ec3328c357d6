//! A miniature foreign algebra vocabulary for converter tests.
//!
//! Node types mirror a typical computer-algebra class hierarchy, e.g.
//! `Integer -> Rational -> Number -> AtomicExpr -> Expr -> Basic`.

use std::sync::Arc;

use crate::{Field, ForeignExpr, ForeignNode};

const ATOM: &[&str] = &["AtomicExpr", "Expr", "Basic"];
const NUMBER: &[&str] = &["Number", "AtomicExpr", "Expr", "Basic"];
const INTEGER: &[&str] = &["Rational", "Number", "AtomicExpr", "Expr", "Basic"];
const OPERATION: &[&str] = &["AssocOp", "Expr", "Basic"];
const EXPR: &[&str] = &["Expr", "Basic"];
const FUNCTION: &[&str] = &["Function", "Application", "Expr", "Basic"];

#[derive(Debug)]
enum Slot {
    Expr(ForeignExpr),
    List(Vec<ForeignExpr>),
    Text(String),
}

/// Generic foreign node: a type name, an ancestor chain and named slots
#[derive(Debug)]
pub(crate) struct Node {
    type_name: String,
    ancestors: &'static [&'static str],
    args: Vec<ForeignExpr>,
    fields: Vec<(&'static str, Slot)>,
    function: bool,
}

impl Node {
    fn new(type_name: impl Into<String>, ancestors: &'static [&'static str]) -> Self {
        Self {
            type_name: type_name.into(),
            ancestors,
            args: Vec::new(),
            fields: Vec::new(),
            function: false,
        }
    }

    fn args(mut self, args: Vec<ForeignExpr>) -> Self {
        self.args = args;
        self
    }

    fn expr(mut self, name: &'static str, value: ForeignExpr) -> Self {
        self.fields.push((name, Slot::Expr(value)));
        self
    }

    fn list(mut self, name: &'static str, value: Vec<ForeignExpr>) -> Self {
        self.fields.push((name, Slot::List(value)));
        self
    }

    fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, Slot::Text(value.into())));
        self
    }

    fn build(self) -> ForeignExpr {
        ForeignExpr::Node(Arc::new(self))
    }
}

impl ForeignNode for Node {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn ancestors(&self) -> &[&'static str] {
        self.ancestors
    }

    fn args(&self) -> &[ForeignExpr] {
        &self.args
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, slot)| match slot {
                Slot::Expr(expr) => Field::Expr(expr),
                Slot::List(items) => Field::List(items),
                Slot::Text(text) => Field::Text(text),
            })
    }

    fn is_function(&self) -> bool {
        self.function
    }
}

pub(crate) fn symbol(name: &str) -> ForeignExpr {
    Node::new("Symbol", ATOM).text("name", name).build()
}

pub(crate) fn imaginary_unit() -> ForeignExpr {
    Node::new("ImaginaryUnit", ATOM).build()
}

pub(crate) fn add(args: Vec<ForeignExpr>) -> ForeignExpr {
    Node::new("Add", OPERATION).args(args).build()
}

pub(crate) fn mul(args: Vec<ForeignExpr>) -> ForeignExpr {
    Node::new("Mul", OPERATION).args(args).build()
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 { a.abs() } else { gcd(b, a % b) }
}

/// Reduced ratio; like most algebra systems, an integral ratio comes back as
/// an `Integer` node (a subtype of `Rational` with `q == 1`)
pub(crate) fn rational(p: i64, q: i64) -> ForeignExpr {
    let g = gcd(p, q);
    let (p, q) = (p / g, q / g);
    let (type_name, ancestors) = if q == 1 {
        ("Integer", INTEGER)
    } else {
        ("Rational", NUMBER)
    };
    Node::new(type_name, ancestors)
        .expr("p", ForeignExpr::Int(p))
        .expr("q", ForeignExpr::Int(q))
        .build()
}

pub(crate) fn integer(n: i64) -> ForeignExpr {
    rational(n, 1)
}

/// Floating-point literal; the default converter has no handler for it
pub(crate) fn float(value: f64) -> ForeignExpr {
    Node::new("Float", NUMBER)
        .text("value", value.to_string())
        .build()
}

pub(crate) fn pow(base: ForeignExpr, exp: ForeignExpr) -> ForeignExpr {
    Node::new("Pow", EXPR)
        .expr("base", base)
        .expr("exp", exp)
        .build()
}

pub(crate) fn subs(expr: ForeignExpr, variables: Vec<ForeignExpr>, point: Vec<ForeignExpr>) -> ForeignExpr {
    Node::new("Subs", EXPR)
        .expr("expr", expr)
        .list("variables", variables)
        .list("point", point)
        .build()
}

pub(crate) fn derivative(expr: ForeignExpr, variables: Vec<ForeignExpr>) -> ForeignExpr {
    Node::new("Derivative", EXPR)
        .expr("expr", expr)
        .list("variables", variables)
        .build()
}

/// Application of a function the converter knows nothing about
pub(crate) fn function(name: &str, args: Vec<ForeignExpr>) -> ForeignExpr {
    let mut node = Node::new(name, FUNCTION).args(args);
    node.function = true;
    node.build()
}

/// A node that is neither literal nor function and has no handler anywhere
/// in its lineage
pub(crate) fn opaque(type_name: &str) -> ForeignExpr {
    Node::new(type_name, &["Basic"]).build()
}

/// A `Symbol` missing its `name` field
pub(crate) fn nameless_symbol() -> ForeignExpr {
    Node::new("Symbol", ATOM).build()
}
