//! Get/set dispatch over tree nodes
//!
//! Every node carries a [`NodeBody`] with its kind-specific logic. The
//! engine wraps each call to that logic with the same bookkeeping:
//! recording the current node and object in the [`EvalContext`], the
//! constant cache, and the optional evaluation trace.

mod constant;

pub(crate) use constant::ConstantCache;

use std::fmt;

use crate::error::{EvalError, Result};
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Kind-specific logic of a node.
///
/// Only [`kind`](Self::kind) and [`get_value_body`](Self::get_value_body)
/// are required. Bodies recurse into children through
/// [`NodeRef::get_value`] and [`NodeRef::set_value`], never by calling
/// each other's bodies directly, so every step is cached and traced.
///
/// A body whose [`is_constant`](Self::is_constant) returns true must be
/// pure: its value is computed once per tree and then shared by every
/// evaluation, on every thread, whatever the source object.
pub trait NodeBody: fmt::Debug + Send + Sync {
    /// The kind tag of nodes carrying this body.
    fn kind(&self) -> NodeKind;

    /// Produce this node's value for `source`.
    fn get_value_body(&self, node: NodeRef<'_>, ctx: &mut EvalContext, source: &Value)
        -> Result<Value>;

    /// Assign `value` through this node into `target`.
    ///
    /// The default rejects assignment: the node kind is get-only.
    fn set_value_body(
        &self,
        node: NodeRef<'_>,
        _ctx: &mut EvalContext,
        _target: &Value,
        _value: &Value,
    ) -> Result<()> {
        Err(EvalError::InappropriateExpression {
            kind: node.kind(),
            expression: node.to_string(),
        })
    }

    /// Whether this node is constant without regard to its children.
    fn is_node_constant(&self, _node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(false)
    }

    /// Whether this node's value is independent of the source object.
    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        self.is_node_constant(node, ctx)
    }

    /// Whether this node alone is a plain property read.
    fn is_node_simple_property(&self, _node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(false)
    }

    /// Whether this node is a plain property read.
    fn is_simple_property(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        self.is_node_simple_property(node, ctx)
    }

    /// Whether this node is a single navigation step or a chain of them.
    fn is_simple_navigation_chain(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        self.is_simple_property(node, ctx)
    }

    /// Whether closing the node absorbs same-kind children (associative operators).
    fn flattens(&self) -> bool {
        false
    }

    /// Write the node's expression source.
    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(node.kind().name())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════

impl<'t> NodeRef<'t> {
    /// Evaluate this node against `source`.
    ///
    /// When the context traces evaluations, a record for this call is
    /// pushed before the body runs and completed after it, holding the
    /// result or the failure. Failures are returned unchanged.
    pub fn get_value(self, ctx: &mut EvalContext, source: &Value) -> Result<Value> {
        if !ctx.trace_evaluations() {
            return self.evaluate_get_value_body(ctx, source);
        }

        let evaluation = ctx.pool_mut().create(self, source.clone(), false);
        ctx.push_evaluation(evaluation);
        let result = self.evaluate_get_value_body(ctx, source);
        ctx.complete_evaluation(evaluation, result.as_ref().map(Some));
        result
    }

    /// Assign `value` through this node into `target`.
    ///
    /// Never uses the constant cache. Fails with
    /// [`EvalError::InappropriateExpression`] if the node kind is get-only.
    pub fn set_value(self, ctx: &mut EvalContext, target: &Value, value: &Value) -> Result<()> {
        if !ctx.trace_evaluations() {
            return self.evaluate_set_value_body(ctx, target, value);
        }

        let evaluation = ctx.pool_mut().create(self, target.clone(), true);
        ctx.push_evaluation(evaluation);
        let result = self.evaluate_set_value_body(ctx, target, value);
        ctx.complete_evaluation(evaluation, result.as_ref().map(|_| None));
        result
    }

    /// Whether this node's value is independent of the source object.
    pub fn is_constant(self, ctx: &mut EvalContext) -> Result<bool> {
        self.body().is_constant(self, ctx)
    }

    /// Whether this node is a plain property read.
    pub fn is_simple_property(self, ctx: &mut EvalContext) -> Result<bool> {
        self.body().is_simple_property(self, ctx)
    }

    /// Whether this node is a single navigation step or a chain of them.
    pub fn is_simple_navigation_chain(self, ctx: &mut EvalContext) -> Result<bool> {
        self.body().is_simple_navigation_chain(self, ctx)
    }

    /// Whether every child slot is filled with a constant node.
    ///
    /// Operator bodies use this as their constancy test; a childless node
    /// falls back to its own node-level answer.
    pub fn are_children_constant(self, ctx: &mut EvalContext) -> Result<bool> {
        if self.child_count() == 0 {
            return self.body().is_node_constant(self, ctx);
        }
        for index in 0..self.child_count() {
            match self.child(index) {
                Some(child) if child.is_constant(ctx)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// The cached constant, once a constant evaluation has happened.
    pub fn constant_value(self) -> Option<&'t Value> {
        self.node().constant.get()
    }

    /// Whether the one-time constancy check has run for this node.
    pub fn is_constant_checked(self) -> bool {
        self.node().constant.is_calculated()
    }

    /// The child in slot `index`, or [`EvalError::MissingChild`] for a hole.
    pub fn required_child(self, index: usize) -> Result<NodeRef<'t>> {
        let missing = EvalError::MissingChild {
            kind: self.kind(),
            index,
        };
        if index >= self.child_count() {
            return Err(missing);
        }
        self.child(index).ok_or(missing)
    }

    fn evaluate_get_value_body(self, ctx: &mut EvalContext, source: &Value) -> Result<Value> {
        ctx.set_current_object(source.clone());
        ctx.set_current_node(self.id());

        let body = self.body();
        let cache = &self.node().constant;
        if cache.begin() && body.is_constant(self, ctx)? {
            let value = body.get_value_body(self, ctx, source)?;
            return Ok(cache.store(value).clone());
        }

        match cache.get() {
            Some(value) => Ok(value.clone()),
            None => body.get_value_body(self, ctx, source),
        }
    }

    fn evaluate_set_value_body(
        self,
        ctx: &mut EvalContext,
        target: &Value,
        value: &Value,
    ) -> Result<()> {
        ctx.set_current_object(target.clone());
        ctx.set_current_node(self.id());
        self.body().set_value_body(self, ctx, target, value)
    }
}
