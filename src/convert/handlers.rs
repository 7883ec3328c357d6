//! Default handlers for the common algebra vocabulary

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::{ConvertError, Converter, ForeignExpr, Handler};
use crate::{Expr, Number};

pub(super) fn defaults() -> FxHashMap<&'static str, Handler> {
    let mut map: FxHashMap<&'static str, Handler> = FxHashMap::default();
    map.insert("Symbol", symbol);
    map.insert("ImaginaryUnit", imaginary_unit);
    map.insert("Add", add);
    map.insert("Mul", mul);
    map.insert("Rational", rational);
    map.insert("Pow", pow);
    map.insert("Subs", subs);
    map.insert("Derivative", derivative);
    map
}

fn symbol(_: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    Ok(Expr::variable(node.text_field("name")?))
}

fn imaginary_unit(_: &Converter, _: &ForeignExpr) -> Result<Expr, ConvertError> {
    Ok(Expr::constant(Number::I))
}

fn add(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    Ok(Expr::sum(conv.rec_all(node.args())?))
}

fn mul(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    Ok(Expr::product(conv.rec_all(node.args())?))
}

/// `p/q`, or just `p` when the denominator is one
fn rational(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    let numerator = conv.rec(node.expr_field("p")?)?;
    let denominator = conv.rec(node.expr_field("q")?)?;
    if denominator.is_one() {
        return Ok(numerator);
    }
    Ok(Expr::quotient(numerator, denominator))
}

fn pow(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    let base = conv.rec(node.expr_field("base")?)?;
    let exponent = conv.rec(node.expr_field("exp")?)?;
    Ok(Expr::power(base, exponent))
}

fn subs(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    let child = conv.rec(node.expr_field("expr")?)?;
    let variables = variable_names(node.list_field("variables")?)?;
    let point = conv.rec_all(node.list_field("point")?)?;
    Ok(Expr::substitution(child, variables, point)?)
}

fn derivative(conv: &Converter, node: &ForeignExpr) -> Result<Expr, ConvertError> {
    let child = conv.rec(node.expr_field("expr")?)?;
    let variables = variable_names(node.list_field("variables")?)?;
    Ok(Expr::derivative(child, variables))
}

/// Names of symbol nodes, read from their `name` field
fn variable_names(nodes: &[ForeignExpr]) -> Result<Vec<Arc<str>>, ConvertError> {
    nodes
        .iter()
        .map(|node| node.text_field("name").map(Arc::from))
        .collect()
}
