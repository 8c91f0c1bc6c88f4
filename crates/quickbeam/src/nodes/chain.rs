//! Navigation chains: `a.b.c`

use std::fmt;

use super::fmt_children;
use crate::error::{EvalError, Result};
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Evaluates each link against the previous link's result.
///
/// Chains are associative: `(a.b).c` and `a.(b.c)` navigate the same way,
/// so nested chains flatten into one. A compiled accessor attached to the
/// chain replaces the walk entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chain;

impl NodeBody for Chain {
    fn kind(&self) -> NodeKind {
        NodeKind::Chain
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        if let Some(accessor) = node.accessor() {
            return accessor.get(ctx, source);
        }

        let mut result = source.clone();
        for index in 0..node.child_count() {
            result = node.required_child(index)?.get_value(ctx, &result)?;
        }
        Ok(result)
    }

    fn set_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        target: &Value,
        value: &Value,
    ) -> Result<()> {
        if let Some(accessor) = node.accessor() {
            return accessor.set(ctx, target, value);
        }

        let Some(last) = node.child_count().checked_sub(1) else {
            return Err(EvalError::MissingChild {
                kind: node.kind(),
                index: 0,
            });
        };
        let mut target = target.clone();
        for index in 0..last {
            target = node.required_child(index)?.get_value(ctx, &target)?;
        }
        node.required_child(last)?.set_value(ctx, &target, value)
    }

    fn is_simple_navigation_chain(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        if node.child_count() == 0 {
            return Ok(false);
        }
        for index in 0..node.child_count() {
            match node.child(index) {
                Some(child) if child.is_simple_property(ctx)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn flattens(&self) -> bool {
        true
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_children(node, f, ".")
    }
}
