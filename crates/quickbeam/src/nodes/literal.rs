//! Literal constants

use std::fmt;

use crate::error::Result;
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// A literal value. Always constant.
#[derive(Debug, Clone)]
pub struct Const {
    value: Value,
}

impl Const {
    /// Create a literal.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The literal value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl NodeBody for Const {
    fn kind(&self) -> NodeKind {
        NodeKind::Const
    }

    fn get_value_body(
        &self,
        _node: NodeRef<'_>,
        _ctx: &mut EvalContext,
        _source: &Value,
    ) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn is_node_constant(&self, _node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(true)
    }

    fn fmt_source(&self, _node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}
