//! Method calls: `target.name(args)` and `Type::name(args)`
//!
//! Both node kinds evaluate their children as the call arguments and hand
//! the call to the context's [`MethodAccessor`](crate::method::MethodAccessor).
//! Arguments are evaluated against the context root, not against the
//! object the method is called on.

use std::fmt;

use super::{child_values, fmt_children};
use crate::error::{MethodFailed, Result};
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

fn arguments(node: NodeRef<'_>, ctx: &mut EvalContext) -> Result<Vec<Value>> {
    let root = ctx.root().clone();
    child_values(node, ctx, &root)
}

fn no_gateway(member: String) -> MethodFailed {
    MethodFailed::new(member, "no method accessor configured")
}

/// Calls `name` on the source object.
#[derive(Debug, Clone)]
pub struct MethodCall {
    name: String,
}

impl MethodCall {
    /// Create a call of the method `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NodeBody for MethodCall {
    fn kind(&self) -> NodeKind {
        NodeKind::Method
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        let args = arguments(node, ctx)?;
        let gateway = ctx
            .method_accessor()
            .cloned()
            .ok_or_else(|| no_gateway(format!("{}.{}", source.type_name(), self.name)))?;
        Ok(gateway.call_method(ctx, source, &self.name, &args)?)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        fmt_children(node, f, ", ")?;
        f.write_str(")")
    }
}

/// Calls the static method `name` of a named type.
#[derive(Debug, Clone)]
pub struct StaticMethodCall {
    type_name: String,
    name: String,
}

impl StaticMethodCall {
    /// Create a call of `type_name`'s static method `name`.
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// The type owning the method.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NodeBody for StaticMethodCall {
    fn kind(&self) -> NodeKind {
        NodeKind::StaticMethod
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        _source: &Value,
    ) -> Result<Value> {
        let args = arguments(node, ctx)?;
        let gateway = ctx
            .method_accessor()
            .cloned()
            .ok_or_else(|| no_gateway(format!("{}.{}", self.type_name, self.name)))?;
        Ok(gateway.call_static_method(ctx, &self.type_name, &self.name, &args)?)
    }

    fn fmt_source(&self, node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.type_name.replace('.', "::"), self.name)?;
        fmt_children(node, f, ", ")?;
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::method::MethodRegistry;
    use crate::nodes::{Const, Property};
    use crate::tree::TreeBuilder;
    use crate::value::ObjectValue;

    #[test]
    fn test_static_call_with_root_arguments() {
        let mut builder = TreeBuilder::new();
        let call = builder.node(StaticMethodCall::new("Math", "max"));
        builder.open(call).unwrap();
        let x = builder.leaf(Property::new("x")).unwrap();
        let two = builder.leaf(Const::new(2)).unwrap();
        builder.add_child(call, x, 0).unwrap();
        builder.add_child(call, two, 1).unwrap();
        builder.close(call).unwrap();
        let tree = builder.finish(call).unwrap();
        assert_eq!(tree.to_string(), "Math::max(x, 2)");

        let registry = MethodRegistry::new().with_static_method("Math", "max", |args| {
            Ok(args.iter().filter_map(Value::as_i64).max().into())
        });
        let root = Value::object(ObjectValue::new("P").with_field("x", 7));
        let mut ctx = EvalContext::new()
            .with_root(root.clone())
            .with_method_accessor(Arc::new(registry));

        assert_eq!(tree.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_call_without_gateway_fails() {
        let mut builder = TreeBuilder::new();
        let id = builder.leaf(MethodCall::new("size")).unwrap();
        let tree = builder.finish(id).unwrap();
        assert_eq!(tree.to_string(), "size()");

        let mut ctx = EvalContext::new();
        let err = tree.get_value(&mut ctx, &Value::string("abc")).unwrap_err();
        let failed = err.as_method_failed().unwrap();
        assert_eq!(failed.member, "String.size");
    }

    #[test]
    fn test_method_call_is_get_only() {
        let mut builder = TreeBuilder::new();
        let id = builder.leaf(MethodCall::new("size")).unwrap();
        let tree = builder.finish(id).unwrap();

        let mut ctx = EvalContext::new();
        let err = tree
            .set_value(&mut ctx, &Value::Null, &Value::Int(1))
            .unwrap_err();
        assert!(err.is_inappropriate_expression());
    }
}
