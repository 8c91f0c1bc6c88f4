//! Arithmetic operators
//!
//! Integers stay integers (overflow is an error), mixing in a float
//! promotes to float, and `+` with a string operand concatenates.

use std::fmt;

use super::{child_values, fmt_children};
use crate::error::{EvalError, Result};
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Left fold of a binary operation over the children's values.
fn fold(
    node: NodeRef<'_>,
    ctx: &mut EvalContext,
    source: &Value,
    op: fn(Value, Value) -> Result<Value>,
) -> Result<Value> {
    let mut values = child_values(node, ctx, source)?.into_iter();
    let first = values.next().ok_or(EvalError::MissingChild {
        kind: node.kind(),
        index: 0,
    })?;
    values.try_fold(first, op)
}

fn invalid(op: &'static str, left: &Value, right: &Value) -> EvalError {
    EvalError::InvalidOperands {
        op,
        left_type: left.type_name(),
        right_type: right.type_name(),
    }
}

/// Apply an integer operation, or a float one if either side is a float.
fn numeric(
    op: &'static str,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or(EvalError::IntegerOverflow { op }),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(invalid(op, &left, &right)),
        },
    }
}

pub(crate) fn add(left: Value, right: Value) -> Result<Value> {
    if left.is_string() || right.is_string() {
        return Ok(Value::string(format!("{}{}", left, right)));
    }
    numeric("+", left, right, i64::checked_add, |a, b| a + b)
}

pub(crate) fn subtract(left: Value, right: Value) -> Result<Value> {
    numeric("-", left, right, i64::checked_sub, |a, b| a - b)
}

pub(crate) fn multiply(left: Value, right: Value) -> Result<Value> {
    numeric("*", left, right, i64::checked_mul, |a, b| a * b)
}

pub(crate) fn divide(left: Value, right: Value) -> Result<Value> {
    if right == Value::Int(0) && matches!(left, Value::Int(_)) {
        return Err(EvalError::DivisionByZero);
    }
    numeric("/", left, right, i64::checked_div, |a, b| a / b)
}

// ═══════════════════════════════════════════════════════════════════════
// Node bodies
// ═══════════════════════════════════════════════════════════════════════

/// `a + b + ...`; flattens nested additions and folds left to right.
///
/// Flattening treats `+` as associative even though string concatenation
/// is not: `"a" + (1 + 2)` becomes `"a" + 1 + 2` and yields `"a12"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl NodeBody for Add {
    fn kind(&self) -> NodeKind {
        NodeKind::Add
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        fold(node, ctx, source, add)
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn flattens(&self) -> bool {
        true
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_children(node, f, " + ")
    }
}

/// `a - b`
#[derive(Debug, Clone, Copy, Default)]
pub struct Subtract;

impl NodeBody for Subtract {
    fn kind(&self) -> NodeKind {
        NodeKind::Subtract
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        fold(node, ctx, source, subtract)
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_children(node, f, " - ")
    }
}

/// `a * b * ...`; associative, flattens nested multiplications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multiply;

impl NodeBody for Multiply {
    fn kind(&self) -> NodeKind {
        NodeKind::Multiply
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        fold(node, ctx, source, multiply)
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn flattens(&self) -> bool {
        true
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_children(node, f, " * ")
    }
}

/// `a / b`
#[derive(Debug, Clone, Copy, Default)]
pub struct Divide;

impl NodeBody for Divide {
    fn kind(&self) -> NodeKind {
        NodeKind::Divide
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        fold(node, ctx, source, divide)
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_children(node, f, " / ")
    }
}

/// `-a`
#[derive(Debug, Clone, Copy, Default)]
pub struct Negate;

impl NodeBody for Negate {
    fn kind(&self) -> NodeKind {
        NodeKind::Negate
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        match node.required_child(0)?.get_value(ctx, source)? {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow { op: "-" }),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(EvalError::type_error("number", &other)),
        }
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("-")?;
        fmt_children(node, f, "")
    }
}
