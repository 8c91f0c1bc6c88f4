//! List literals: `[a, b, c]`

use std::fmt;

use super::child_values;
use crate::error::Result;
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Builds a list from its children's values. Constant when they all are.
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

impl NodeBody for List {
    fn kind(&self) -> NodeKind {
        NodeKind::List
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        Ok(Value::list(child_values(node, ctx, source)?))
    }

    fn is_node_constant(&self, node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(node.child_count() == 0)
    }

    fn is_constant(&self, node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<bool> {
        node.are_children_constant(ctx)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        super::fmt_children(node, f, ", ")?;
        f.write_str("]")
    }
}
