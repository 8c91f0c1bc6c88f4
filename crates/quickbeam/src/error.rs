//! Error types for Quickbeam evaluation

use thiserror::Error;

use crate::tree::{NodeId, NodeKind};
use crate::value::Value;

/// Error raised while getting or setting a value through a node tree.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The node kind has no assignment logic (it is get-only).
    #[error("Inappropriate expression: `{expression}` ({kind}) cannot be assigned to")]
    InappropriateExpression {
        /// Kind of the offending node
        kind: NodeKind,
        /// Source text of the offending node
        expression: String,
    },

    /// A method invocation failed (resolution, invocation or authorization).
    #[error(transparent)]
    MethodFailed(#[from] MethodFailed),

    /// The source object has no such property.
    #[error("No such property `{name}` on {type_name}")]
    NoSuchProperty {
        /// Property name
        name: String,
        /// Type of the source object
        type_name: String,
    },

    /// Type mismatch error
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type received
        got: String,
    },

    /// Operands not supported by an operator
    #[error("Invalid operands for `{op}`: {left_type} and {right_type}")]
    InvalidOperands {
        /// Operator symbol
        op: &'static str,
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    /// Integer arithmetic overflowed
    #[error("Integer overflow in `{op}`")]
    IntegerOverflow {
        /// Operator symbol
        op: &'static str,
    },

    /// Division or remainder by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// A node was evaluated without a required child
    #[error("{kind} node is missing child {index}")]
    MissingChild {
        /// Kind of the incomplete node
        kind: NodeKind,
        /// Index of the empty slot
        index: usize,
    },
}

impl EvalError {
    /// Build a type error from the expected type and the offending value.
    pub fn type_error(expected: impl Into<String>, got: &Value) -> Self {
        EvalError::TypeError {
            expected: expected.into(),
            got: got.type_name(),
        }
    }

    /// Whether this is the "cannot assign to this node kind" failure.
    pub fn is_inappropriate_expression(&self) -> bool {
        matches!(self, EvalError::InappropriateExpression { .. })
    }

    /// The invocation failure, if this error is one.
    pub fn as_method_failed(&self) -> Option<&MethodFailed> {
        match self {
            EvalError::MethodFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure of a method invocation made through a [`MethodAccessor`].
///
/// Resolution failures, errors raised by the method itself and permission
/// denials all share this one shape; the underlying cause is kept as the
/// error source.
///
/// [`MethodAccessor`]: crate::method::MethodAccessor
#[derive(Error, Debug)]
#[error("Method `{member}` failed: {cause}")]
pub struct MethodFailed {
    /// Fully qualified member name (`Type.method`)
    pub member: String,

    /// Underlying cause
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl MethodFailed {
    /// Wrap a cause for the given member.
    pub fn new(
        member: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            member: member.into(),
            cause: cause.into(),
        }
    }

    /// Whether the invocation was refused by the permission policy.
    pub fn is_denied(&self) -> bool {
        self.cause.downcast_ref::<PermissionDenied>().is_some()
    }

    /// Whether the member could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        self.cause.downcast_ref::<NoSuchMethod>().is_some()
    }
}

/// The invocation policy refused a permission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Permission denied: {permission}")]
pub struct PermissionDenied {
    /// Name of the refused permission
    pub permission: String,
}

/// No method is registered under the requested name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No such method `{member}`")]
pub struct NoSuchMethod {
    /// Fully qualified member name
    pub member: String,
}

/// A permission name that cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPermission {
    /// Permission names must not be empty
    #[error("Permission name is empty")]
    EmptyName,
}

/// Misuse of the tree construction protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The id does not belong to this builder
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// Children can only be attached between `open` and `close`
    #[error("Node {0} is not open for construction")]
    NotOpen(NodeId),

    /// A closed node cannot be reopened
    #[error("Node {0} is already closed")]
    AlreadyClosed(NodeId),

    /// A node can have at most one parent
    #[error("Node {child} already has parent {parent}")]
    AlreadyAttached {
        /// The child being attached
        child: NodeId,
        /// Its existing parent
        parent: NodeId,
    },

    /// A node cannot be its own child
    #[error("Node {0} cannot be attached to itself")]
    SelfReference(NodeId),

    /// `finish` reached a node that was never closed
    #[error("Node {0} was never closed")]
    Unclosed(NodeId),

    /// Flattening rebuilt a different number of children than it computed.
    ///
    /// Indicates a defect in the builder, never bad input.
    #[error("Internal consistency failure flattening node {node}: {actual} != {expected}")]
    InternalConsistency {
        /// Node being flattened
        node: NodeId,
        /// Precomputed child count
        expected: usize,
        /// Rebuilt child count
        actual: usize,
    },
}

/// Result type alias for Quickbeam evaluation
pub type Result<T, E = EvalError> = std::result::Result<T, E>;
