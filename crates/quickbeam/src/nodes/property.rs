//! Property navigation

use std::fmt;

use crate::error::{EvalError, Result};
use crate::eval::NodeBody;
use crate::tree::{NodeKind, NodeRef};
use crate::{EvalContext, Value};

/// Reads or writes the named field of the source object.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
}

impl Property {
    /// Create a property node for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn missing(&self, source: &Value) -> EvalError {
        EvalError::NoSuchProperty {
            name: self.name.clone(),
            type_name: source.type_name(),
        }
    }
}

impl NodeBody for Property {
    fn kind(&self) -> NodeKind {
        NodeKind::Property
    }

    fn get_value_body(
        &self,
        _node: NodeRef<'_>,
        _ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        match source {
            Value::Object(object) => object.get(&self.name).ok_or_else(|| self.missing(source)),
            _ => Err(self.missing(source)),
        }
    }

    fn set_value_body(
        &self,
        _node: NodeRef<'_>,
        _ctx: &mut EvalContext,
        target: &Value,
        value: &Value,
    ) -> Result<()> {
        match target {
            Value::Object(object) => {
                object.set(self.name.clone(), value.clone());
                Ok(())
            }
            _ => Err(EvalError::type_error("object", target)),
        }
    }

    fn is_node_simple_property(&self, _node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(true)
    }

    fn fmt_source(&self, _node: NodeRef<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use crate::value::ObjectValue;

    #[test]
    fn test_get_and_set() {
        let mut builder = TreeBuilder::new();
        let id = builder.leaf(Property::new("name")).unwrap();
        let tree = builder.finish(id).unwrap();
        let person = Value::object(ObjectValue::new("Person").with_field("name", "Ann"));
        let mut ctx = EvalContext::new();

        assert_eq!(tree.get_value(&mut ctx, &person).unwrap(), Value::string("Ann"));
        tree.set_value(&mut ctx, &person, &Value::string("Bo")).unwrap();
        assert_eq!(tree.get_value(&mut ctx, &person).unwrap(), Value::string("Bo"));
    }

    #[test]
    fn test_missing_property() {
        let mut builder = TreeBuilder::new();
        let id = builder.leaf(Property::new("age")).unwrap();
        let tree = builder.finish(id).unwrap();
        let mut ctx = EvalContext::new();

        let err = tree
            .get_value(&mut ctx, &Value::object(ObjectValue::new("Person")))
            .unwrap_err();
        assert_eq!(err.to_string(), "No such property `age` on Person");

        let err = tree
            .set_value(&mut ctx, &Value::Int(1), &Value::Null)
            .unwrap_err();
        assert!(matches!(err, EvalError::TypeError { .. }));
    }
}
