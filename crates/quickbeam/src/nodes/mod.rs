//! Reference node kinds
//!
//! A small set of node bodies covering literals, property navigation,
//! arithmetic, lists and method calls. They are what the bundled
//! [`frontend`](crate::frontend) produces, and a template for hosts that
//! define their own [`NodeBody`](crate::NodeBody) implementations.

mod arithmetic;
mod chain;
mod list;
mod literal;
mod method;
mod property;

pub use arithmetic::{Add, Divide, Multiply, Negate, Subtract};
pub use chain::Chain;
pub use list::List;
pub use literal::Const;
pub use method::{MethodCall, StaticMethodCall};
pub use property::Property;

use std::fmt;

use crate::error::Result;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Evaluate every child slot against `source`, in order.
///
/// A hole is an evaluation failure.
pub(crate) fn child_values(
    node: NodeRef<'_>,
    ctx: &mut EvalContext,
    source: &Value,
) -> Result<Vec<Value>> {
    (0..node.child_count())
        .map(|index| node.required_child(index)?.get_value(ctx, source))
        .collect()
}

/// Write the children separated by `separator`, parenthesizing operators.
pub(crate) fn fmt_children(
    node: NodeRef<'_>,
    f: &mut fmt::Formatter<'_>,
    separator: &str,
) -> fmt::Result {
    for (index, child) in node.children().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        let operator = matches!(
            child.kind(),
            NodeKind::Add | NodeKind::Subtract | NodeKind::Multiply | NodeKind::Divide
        );
        if operator {
            write!(f, "({})", child)?;
        } else {
            write!(f, "{}", child)?;
        }
    }
    Ok(())
}
