//! Tree construction: the open / add-child / close protocol

use dashmap::DashMap;
use tracing::trace;

use super::{flatten, Node, NodeId, NodeKind, Tree};
use crate::error::BuildError;
use crate::eval::{ConstantCache, NodeBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Open,
    Closed,
}

#[derive(Debug)]
pub(super) struct Slot {
    pub(super) kind: NodeKind,
    pub(super) body: Box<dyn NodeBody>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<Option<NodeId>>,
    state: State,
}

/// Builds a [`Tree`] node by node.
///
/// Each node is created, opened, given its children, and closed. Closing
/// a node whose body is associative flattens same-kind children into it.
/// [`finish`](Self::finish) freezes the nodes reachable from the root
/// into an immutable tree.
///
/// # Example
///
/// ```
/// use quickbeam::nodes::{Add, Const};
/// use quickbeam::{EvalContext, TreeBuilder, Value};
///
/// let mut builder = TreeBuilder::new();
/// let sum = builder.node(Add);
/// builder.open(sum).unwrap();
/// let one = builder.leaf(Const::new(1)).unwrap();
/// let two = builder.leaf(Const::new(2)).unwrap();
/// builder.add_child(sum, one, 0).unwrap();
/// builder.add_child(sum, two, 1).unwrap();
/// builder.close(sum).unwrap();
///
/// let tree = builder.finish(sum).unwrap();
/// let mut ctx = EvalContext::new();
/// assert_eq!(tree.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(3));
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    pub(super) slots: Vec<Slot>,
}

impl TreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node carrying `body`. It must be opened before children are added.
    pub fn node(&mut self, body: impl NodeBody + 'static) -> NodeId {
        self.node_boxed(Box::new(body))
    }

    /// Create a node from an already boxed body.
    pub fn node_boxed(&mut self, body: Box<dyn NodeBody>) -> NodeId {
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Slot {
            kind: body.kind(),
            body,
            parent: None,
            children: Vec::new(),
            state: State::Created,
        });
        id
    }

    /// Create, open and close a childless node.
    pub fn leaf(&mut self, body: impl NodeBody + 'static) -> Result<NodeId, BuildError> {
        let id = self.node(body);
        self.open(id)?;
        self.close(id)?;
        Ok(id)
    }

    /// Open a node for construction.
    pub fn open(&mut self, id: NodeId) -> Result<(), BuildError> {
        let slot = self.slot_mut(id)?;
        match slot.state {
            State::Closed => Err(BuildError::AlreadyClosed(id)),
            _ => {
                slot.state = State::Open;
                Ok(())
            }
        }
    }

    /// Attach `child` to `parent` at `index`.
    ///
    /// The child list grows as needed; slots between the previous end and
    /// `index` stay empty until filled. Filling an occupied slot detaches
    /// the node that was there. The child's parent link is set here, so a
    /// node's parent and that parent's child slot always agree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), BuildError> {
        if parent == child {
            return Err(BuildError::SelfReference(parent));
        }
        if self.slot(parent)?.state != State::Open {
            return Err(BuildError::NotOpen(parent));
        }
        if let Some(existing) = self.slot(child)?.parent {
            return Err(BuildError::AlreadyAttached {
                child,
                parent: existing,
            });
        }

        let children = &mut self.slots[parent.index()].children;
        if index >= children.len() {
            children.resize(index + 1, None);
        }
        let displaced = children[index].replace(child);

        if let Some(old) = displaced {
            self.slots[old.index()].parent = None;
        }
        self.slots[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Finish construction of a node, flattening it if its body is associative.
    pub fn close(&mut self, id: NodeId) -> Result<(), BuildError> {
        let slot = self.slot_mut(id)?;
        match slot.state {
            State::Open => slot.state = State::Closed,
            State::Closed => return Err(BuildError::AlreadyClosed(id)),
            State::Created => return Err(BuildError::NotOpen(id)),
        }
        if slot.body.flattens() {
            flatten::flatten(self, id)?;
        }
        Ok(())
    }

    /// The node's parent, if it has been attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.index()).and_then(|slot| slot.parent)
    }

    /// Number of child slots of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.slots
            .get(id.index())
            .map_or(0, |slot| slot.children.len())
    }

    /// The child in slot `index`, if filled.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.children.get(index).copied().flatten())
    }

    /// Freeze the nodes reachable from `root` into a [`Tree`].
    ///
    /// Nodes left behind by flattening (or never attached) are dropped and
    /// the survivors are renumbered in depth-first pre-order, so the root
    /// becomes node `#0`.
    pub fn finish(self, root: NodeId) -> Result<Tree, BuildError> {
        let root_slot = self.slot(root)?;
        if let Some(parent) = root_slot.parent {
            return Err(BuildError::AlreadyAttached {
                child: root,
                parent,
            });
        }

        let order = self.preorder(root)?;
        let mut renumbered: Vec<Option<NodeId>> = vec![None; self.slots.len()];
        for (new, old) in order.iter().enumerate() {
            renumbered[old.index()] = Some(NodeId::from_index(new));
        }

        let mut slots: Vec<Option<Slot>> = self.slots.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let Some(slot) = slots[old.index()].take() else {
                continue;
            };
            let remap = |id: NodeId| renumbered[id.index()];
            nodes.push(Node {
                kind: slot.kind,
                body: slot.body,
                parent: slot.parent.and_then(remap),
                children: slot
                    .children
                    .iter()
                    .map(|child| child.and_then(remap))
                    .collect(),
                constant: ConstantCache::new(),
            });
        }

        trace!(
            nodes = nodes.len(),
            dropped = slots.iter().filter(|slot| slot.is_some()).count(),
            "finished tree"
        );
        Ok(Tree {
            nodes,
            accessors: DashMap::new(),
        })
    }

    fn preorder(&self, root: NodeId) -> Result<Vec<NodeId>, BuildError> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let slot = self.slot(id)?;
            if slot.state != State::Closed {
                return Err(BuildError::Unclosed(id));
            }
            order.push(id);
            stack.extend(slot.children.iter().rev().flatten());
        }
        Ok(order)
    }

    pub(super) fn slot(&self, id: NodeId) -> Result<&Slot, BuildError> {
        self.slots
            .get(id.index())
            .ok_or(BuildError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, BuildError> {
        self.slots
            .get_mut(id.index())
            .ok_or(BuildError::UnknownNode(id))
    }
}
