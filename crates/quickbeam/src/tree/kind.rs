//! Node kinds and their display names

use std::fmt;

/// Tag identifying what a node is.
///
/// Used for display and for deciding which children a node absorbs when
/// it is flattened. Hosts extending the language with their own node
/// bodies tag them with [`NodeKind::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Literal value
    Const,
    /// Named property of the source object
    Property,
    /// Navigation chain `a.b.c`
    Chain,
    /// Addition / concatenation
    Add,
    /// Subtraction
    Subtract,
    /// Multiplication
    Multiply,
    /// Division
    Divide,
    /// Unary minus
    Negate,
    /// List literal
    List,
    /// Instance method call
    Method,
    /// Static method call
    StaticMethod,
    /// Host-defined kind
    Custom(&'static str),
}

impl NodeKind {
    /// Human-readable name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Const => "Const",
            NodeKind::Property => "Property",
            NodeKind::Chain => "Chain",
            NodeKind::Add => "Add",
            NodeKind::Subtract => "Subtract",
            NodeKind::Multiply => "Multiply",
            NodeKind::Divide => "Divide",
            NodeKind::Negate => "Negate",
            NodeKind::List => "List",
            NodeKind::Method => "Method",
            NodeKind::StaticMethod => "StaticMethod",
            NodeKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
