//! Immutable expression trees
//!
//! A [`Tree`] is produced by a [`TreeBuilder`] once every node has gone
//! through the open / add-child / close construction protocol. After that
//! the structure never changes: it can be evaluated repeatedly, from any
//! number of threads, each evaluation with its own [`EvalContext`].
//!
//! Nodes live in a flat table and refer to each other by [`NodeId`].
//! [`NodeRef`] is the borrowed view used for traversal and evaluation.
//!
//! [`EvalContext`]: crate::EvalContext

mod builder;
mod flatten;
mod kind;

pub use builder::TreeBuilder;
pub use kind::NodeKind;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::accessor::CompiledAccessor;
use crate::eval::{ConstantCache, NodeBody};

/// Index of a node within its tree (or builder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        // Trees are built from parsed source text; four billion nodes is not a real tree.
        NodeId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A frozen tree node.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) body: Box<dyn NodeBody>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<Option<NodeId>>,
    pub(crate) constant: ConstantCache,
}

/// An immutable, shareable expression tree.
#[derive(Debug)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) accessors: DashMap<NodeId, Arc<dyn CompiledAccessor>>,
}

impl Tree {
    /// The root node.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Look up a node by id.
    ///
    /// # Panics
    ///
    /// Panics if the id does not belong to this tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} is not part of this tree", id),
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes (never true for a finished tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |index| NodeRef {
            tree: self,
            id: NodeId::from_index(index),
        })
    }

    /// Render the tree one node per line, children indented under parents.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.root().dump_into(&mut out, "");
        out
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root(), f)
    }
}

/// Borrowed view of one node of a [`Tree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    /// The tree this node belongs to.
    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// This node's kind.
    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    /// The node-specific logic attached to this node.
    pub fn body(&self) -> &'t dyn NodeBody {
        self.node().body.as_ref()
    }

    /// The parent node, if this is not the root.
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node().parent.map(|id| self.at(id))
    }

    /// Number of child slots: the largest index ever filled plus one.
    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// The child in slot `index`, or `None` if the slot was never filled.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.child_count()`.
    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        let children = &self.node().children;
        assert!(
            index < children.len(),
            "child index {} out of range for {} node with {} children",
            index,
            self.kind(),
            children.len()
        );
        children[index].map(|id| self.at(id))
    }

    /// The filled child slots, in order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        tree.slot(self.id)
            .children
            .iter()
            .flatten()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Position of this node among its parent's children.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.node().parent?;
        self.tree
            .slot(parent)
            .children
            .iter()
            .position(|child| *child == Some(self.id))
    }

    /// The node in the parent's next slot, if any.
    pub fn next_sibling(&self) -> Option<NodeRef<'t>> {
        let index = self.index_in_parent()?;
        let parent = self.parent()?;
        if index + 1 < parent.child_count() {
            parent.child(index + 1)
        } else {
            None
        }
    }

    fn dump_into(&self, out: &mut String, prefix: &str) {
        out.push_str(&format!("{}{} {}\n", prefix, self.kind(), self));
        let prefix = format!("{}  ", prefix);
        for child in self.children() {
            child.dump_into(out, &prefix);
        }
    }

    pub(crate) fn node(&self) -> &'t Node {
        self.tree.slot(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'t> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.body().fmt_source(*self, f)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}
