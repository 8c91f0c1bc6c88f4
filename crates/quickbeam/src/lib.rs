//! # Quickbeam
//!
//! Evaluation core for object-graph navigation expressions.
//!
//! An expression such as `order.customer.name` or `items.size() + 1` is
//! held as an immutable tree of nodes. Quickbeam evaluates that tree
//! against a source object (reading values) or a target object (assigning
//! through it), and takes care of the bookkeeping every node shares:
//!
//! - **Trees**: built through an open / add-child / close protocol that
//!   flattens associative operators (`(a + b) + c` becomes `a + b + c`)
//! - **Constants**: a subtree whose value cannot depend on the source is
//!   computed once and then shared by every later evaluation
//! - **Traces**: optional per-context records of every get and set, kept
//!   after a failure for diagnosis
//! - **Compiled accessors**: native replacements for a subtree's logic,
//!   attachable while other threads evaluate the tree
//! - **Method gateway**: method calls go through a replaceable accessor
//!   that can check invocation permissions
//!
//! ## Example
//!
//! ```
//! use quickbeam::value::ObjectValue;
//! use quickbeam::{parse_expression, EvalContext, Value};
//!
//! let tree = parse_expression("point.x + point.y").unwrap();
//! let point = ObjectValue::new("Point").with_field("x", 3).with_field("y", 4);
//! let root = Value::object(ObjectValue::new("Root").with_field("point", point));
//!
//! let mut ctx = EvalContext::new().with_root(root.clone());
//! assert_eq!(tree.get_value(&mut ctx, &root).unwrap(), Value::Int(7));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accessor;
pub mod context;
pub mod error;
pub mod eval;
pub mod frontend;
pub mod method;
pub mod nodes;
pub mod trace;
pub mod tree;
pub mod value;

// Re-export main types
pub use accessor::CompiledAccessor;
pub use context::EvalContext;
pub use error::{
    BuildError, EvalError, InvalidPermission, MethodFailed, NoSuchMethod, PermissionDenied, Result,
};
pub use eval::NodeBody;
pub use frontend::{parse_expression, ParseError, SourceLocation};
pub use method::{InvocationPolicy, InvokePermission, MethodAccessor, MethodRegistry, PermissionSet};
pub use trace::{Evaluation, EvaluationId, EvaluationPool};
pub use tree::{NodeId, NodeKind, NodeRef, Tree, TreeBuilder};
pub use value::{ObjectRef, ObjectValue, Value};

/// Quickbeam version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
