//! Compiled accessors: the fast-path escape hatch
//!
//! A backend that can turn a subtree into native code attaches the result
//! to the subtree's root node. Node bodies (and the [`Tree`] entry points)
//! prefer an attached accessor over interpreting the subtree. Accessors
//! may be attached or replaced at any time, including while other threads
//! evaluate the tree: each evaluation sees either the old accessor or the
//! new one.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::tree::{NodeId, NodeRef, Tree};
use crate::{EvalContext, Value};

/// Natively compiled equivalent of a subtree's get/set logic.
///
/// Must produce the same results as interpreting the subtree.
pub trait CompiledAccessor: fmt::Debug + Send + Sync {
    /// Compiled form of the subtree's get.
    fn get(&self, ctx: &mut EvalContext, source: &Value) -> Result<Value>;

    /// Compiled form of the subtree's set.
    fn set(&self, ctx: &mut EvalContext, target: &Value, value: &Value) -> Result<()>;
}

impl Tree {
    /// Attach (or replace) the accessor of node `id`.
    pub fn set_accessor(&self, id: NodeId, accessor: Arc<dyn CompiledAccessor>) {
        self.accessors.insert(id, accessor);
    }

    /// Detach the accessor of node `id`, returning it.
    pub fn clear_accessor(&self, id: NodeId) -> Option<Arc<dyn CompiledAccessor>> {
        self.accessors.remove(&id).map(|(_, accessor)| accessor)
    }

    /// Evaluate the tree against `root`.
    ///
    /// Uses the root node's compiled accessor when one is attached,
    /// otherwise interprets the tree.
    pub fn get_value(&self, ctx: &mut EvalContext, root: &Value) -> Result<Value> {
        let node = self.root();
        match node.accessor() {
            Some(accessor) => accessor.get(ctx, root),
            None => node.get_value(ctx, root),
        }
    }

    /// Assign `value` through the tree into `root`.
    ///
    /// Uses the root node's compiled accessor when one is attached,
    /// otherwise interprets the tree.
    pub fn set_value(&self, ctx: &mut EvalContext, root: &Value, value: &Value) -> Result<()> {
        let node = self.root();
        match node.accessor() {
            Some(accessor) => accessor.set(ctx, root, value),
            None => node.set_value(ctx, root, value),
        }
    }
}

impl NodeRef<'_> {
    /// Whether a compiled accessor is attached to this node.
    pub fn has_accessor(&self) -> bool {
        self.tree().accessors.contains_key(&self.id())
    }

    /// The attached compiled accessor.
    ///
    /// Returns a clone of the handle, so the accessor may be replaced
    /// while the caller is still using the old one.
    pub fn accessor(&self) -> Option<Arc<dyn CompiledAccessor>> {
        self.tree()
            .accessors
            .get(&self.id())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Attach (or replace) this node's accessor.
    pub fn set_accessor(&self, accessor: Arc<dyn CompiledAccessor>) {
        self.tree().set_accessor(self.id(), accessor);
    }
}
