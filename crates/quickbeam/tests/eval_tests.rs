//! Engine tests: constant caching, set dispatch, normalization end to end

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use quickbeam::nodes::{Add, Const, Property};
use quickbeam::*;

/// Body that counts how often it runs and returns its source unchanged.
#[derive(Debug)]
struct Counting {
    runs: Arc<AtomicUsize>,
    constant: bool,
}

impl NodeBody for Counting {
    fn kind(&self) -> NodeKind {
        NodeKind::Custom("Counting")
    }

    fn get_value_body(
        &self,
        _node: NodeRef<'_>,
        _ctx: &mut EvalContext,
        source: &Value,
    ) -> Result<Value> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(source.clone())
    }

    fn is_node_constant(&self, _node: NodeRef<'_>, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(self.constant)
    }
}

fn counting(constant: bool) -> (Tree, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut builder = TreeBuilder::new();
    let id = builder
        .leaf(Counting {
            runs: Arc::clone(&runs),
            constant,
        })
        .unwrap();
    (builder.finish(id).unwrap(), runs)
}

fn xyz() -> Value {
    Value::object(
        ObjectValue::new("Vars")
            .with_field("x", 1)
            .with_field("y", 2)
            .with_field("z", 3),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Constant caching
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_constant_computed_once_across_sources() {
    let (tree, runs) = counting(true);
    let mut ctx = EvalContext::new();

    let first = tree.get_value(&mut ctx, &Value::Int(1)).unwrap();
    let second = tree.get_value(&mut ctx, &Value::Int(2)).unwrap();
    let third = tree.get_value(&mut EvalContext::new(), &Value::string("other")).unwrap();

    assert_eq!(first, Value::Int(1));
    assert_eq!(second, Value::Int(1));
    assert_eq!(third, Value::Int(1));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(tree.root().constant_value(), Some(&Value::Int(1)));
}

#[test]
fn test_non_constant_runs_every_call() {
    let (tree, runs) = counting(false);
    let mut ctx = EvalContext::new();

    for n in 0..5 {
        assert_eq!(tree.get_value(&mut ctx, &Value::Int(n)).unwrap(), Value::Int(n));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 5);
    assert!(tree.root().is_constant_checked());
    assert_eq!(tree.root().constant_value(), None);
}

#[test]
fn test_constant_operator_folds() {
    let tree = parse_expression("(1 + 2) * 4").unwrap();
    let mut ctx = EvalContext::new();

    assert!(tree.root().is_constant(&mut ctx).unwrap());
    assert_eq!(tree.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(12));
    assert_eq!(tree.root().constant_value(), Some(&Value::Int(12)));
}

#[test]
fn test_mixed_operator_is_not_cached() {
    let tree = parse_expression("x + 10").unwrap();
    let mut ctx = EvalContext::new();

    assert_eq!(tree.get_value(&mut ctx, &xyz()).unwrap(), Value::Int(11));
    assert_eq!(tree.root().constant_value(), None);
    assert_eq!(tree.root().child(1).unwrap().constant_value(), Some(&Value::Int(10)));
}

// ═══════════════════════════════════════════════════════════════════════
// Set dispatch
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_set_on_get_only_node_is_inappropriate() {
    let tree = parse_expression("x + 1").unwrap();
    let mut ctx = EvalContext::new();

    let err = tree.set_value(&mut ctx, &xyz(), &Value::Int(5)).unwrap_err();
    assert!(err.is_inappropriate_expression());
    assert_eq!(
        err.to_string(),
        "Inappropriate expression: `x + 1` (Add) cannot be assigned to"
    );
}

#[test]
fn test_set_through_chain_is_visible_to_every_holder() {
    let inner = Value::object(ObjectValue::new("Inner").with_field("v", 1));
    let root = Value::object(ObjectValue::new("Outer").with_field("inner", inner.clone()));
    let tree = parse_expression("inner.v").unwrap();
    let mut ctx = EvalContext::new();

    tree.set_value(&mut ctx, &root, &Value::Int(9)).unwrap();
    assert_eq!(inner.as_object().and_then(|o| o.get("v")), Some(Value::Int(9)));
    assert_eq!(tree.get_value(&mut ctx, &root).unwrap(), Value::Int(9));
}

#[test]
fn test_set_never_touches_constant_cache() {
    let (tree, runs) = counting(true);
    let mut ctx = EvalContext::new();

    let err = tree.set_value(&mut ctx, &Value::Null, &Value::Int(1)).unwrap_err();
    assert!(err.is_inappropriate_expression());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(!tree.root().is_constant_checked());
}

// ═══════════════════════════════════════════════════════════════════════
// Normalization scenario
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_x_plus_y_plus_z() {
    let tree = parse_expression("x + y + z").unwrap();
    assert_eq!(tree.root().kind(), NodeKind::Add);
    assert_eq!(tree.root().child_count(), 3);
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.dump(), "Add x + y + z\n  Property x\n  Property y\n  Property z\n");

    let mut ctx = EvalContext::new();
    assert_eq!(tree.get_value(&mut ctx, &xyz()).unwrap(), Value::Int(6));
}

#[test]
fn test_x_plus_y_plus_z_by_hand() {
    let mut builder = TreeBuilder::new();
    let inner = builder.node(Add);
    builder.open(inner).unwrap();
    let x = builder.leaf(Property::new("x")).unwrap();
    let y = builder.leaf(Property::new("y")).unwrap();
    builder.add_child(inner, x, 0).unwrap();
    builder.add_child(inner, y, 1).unwrap();
    builder.close(inner).unwrap();

    let outer = builder.node(Add);
    builder.open(outer).unwrap();
    let z = builder.leaf(Property::new("z")).unwrap();
    builder.add_child(outer, inner, 0).unwrap();
    builder.add_child(outer, z, 1).unwrap();
    builder.close(outer).unwrap();
    assert_eq!(builder.child_count(outer), 3);

    let tree = builder.finish(outer).unwrap();
    let mut ctx = EvalContext::new();
    assert_eq!(tree.get_value(&mut ctx, &xyz()).unwrap(), Value::Int(6));
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic failures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic_failures() {
    let mut ctx = EvalContext::new();

    let err = parse_expression("x / 0").unwrap().get_value(&mut ctx, &xyz()).unwrap_err();
    assert!(matches!(err, EvalError::DivisionByZero));

    let err = parse_expression("x + true").unwrap().get_value(&mut ctx, &xyz()).unwrap_err();
    assert!(matches!(err, EvalError::InvalidOperands { op: "+", .. }));

    let err = parse_expression("-\"s\"").unwrap().get_value(&mut ctx, &xyz()).unwrap_err();
    assert!(matches!(err, EvalError::TypeError { .. }));
}

#[test]
fn test_string_concatenation_and_lists() {
    let mut ctx = EvalContext::new();
    let person = Value::object(ObjectValue::new("Person").with_field("name", "Ann"));

    let greeting = parse_expression("\"Hello, \" + name + \"!\"").unwrap();
    assert_eq!(
        greeting.get_value(&mut ctx, &person).unwrap(),
        Value::string("Hello, Ann!")
    );

    let list = parse_expression("[name, 1 + 1]").unwrap();
    assert_eq!(
        list.get_value(&mut ctx, &person).unwrap(),
        Value::list(vec![Value::string("Ann"), Value::Int(2)])
    );
}

#[test]
fn test_const_is_the_literal() {
    let mut builder = TreeBuilder::new();
    let id = builder.leaf(Const::new("lit")).unwrap();
    let tree = builder.finish(id).unwrap();
    let mut ctx = EvalContext::new();
    assert_eq!(tree.get_value(&mut ctx, &xyz()).unwrap(), Value::string("lit"));
}

#[test]
fn test_concatenating_a_self_referencing_object() {
    let object = ObjectRef::new(ObjectValue::new("O").with_field("n", 1));
    object.set("me", Value::Object(object.clone()));
    let source = Value::Object(object);

    let tree = parse_expression("\"n=\" + me").unwrap();
    let mut ctx = EvalContext::new();
    assert_eq!(
        tree.get_value(&mut ctx, &source).unwrap(),
        Value::string("n=O { n: 1, me: <cycle> }")
    );

    let twin = ObjectRef::new(ObjectValue::new("O").with_field("n", 1));
    twin.set("me", Value::Object(twin.clone()));
    assert_eq!(source, Value::Object(twin));
}
