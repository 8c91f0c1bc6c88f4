//! Evaluation trace tests: stack discipline, retention, pool conservation

use std::sync::Mutex;

use pretty_assertions::assert_eq;
use quickbeam::nodes::List;
use quickbeam::*;

fn graph() -> Value {
    let a = ObjectValue::new("A").with_field("b", 2);
    Value::object(ObjectValue::new("Root").with_field("a", a))
}

fn tracing() -> EvalContext {
    EvalContext::new().with_trace_evaluations(true)
}

/// Body that records the trace depth it observes while running.
#[derive(Debug, Default)]
struct DepthRecorder {
    depths: Mutex<Vec<usize>>,
}

impl NodeBody for DepthRecorder {
    fn kind(&self) -> NodeKind {
        NodeKind::Custom("DepthRecorder")
    }

    fn get_value_body(
        &self,
        node: NodeRef<'_>,
        ctx: &mut EvalContext,
        _source: &Value,
    ) -> Result<Value> {
        let depth = ctx.evaluation_depth();
        if let Ok(mut depths) = self.depths.lock() {
            depths.push(depth);
        }
        let current = ctx.current_evaluation().and_then(|id| ctx.evaluation(id));
        assert_eq!(current.map(Evaluation::node), Some(node.id()));
        Ok(Value::Int(depth as i64))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Stack discipline
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_records_follow_call_stack() {
    let mut builder = TreeBuilder::new();
    let list = builder.node(List);
    builder.open(list).unwrap();
    let first = builder.leaf(DepthRecorder::default()).unwrap();
    let second = builder.leaf(DepthRecorder::default()).unwrap();
    builder.add_child(list, first, 0).unwrap();
    builder.add_child(list, second, 1).unwrap();
    builder.close(list).unwrap();
    let tree = builder.finish(list).unwrap();

    let mut ctx = tracing();
    let value = tree.get_value(&mut ctx, &Value::Null).unwrap();
    assert_eq!(value, Value::list(vec![Value::Int(2), Value::Int(2)]));

    assert_eq!(ctx.evaluation_depth(), 0);
    assert_eq!(ctx.current_evaluation(), None);
    assert_eq!(ctx.root_evaluation(), None);
    assert_eq!(ctx.last_evaluation(), None);
}

#[test]
fn test_tracing_disabled_creates_no_records() {
    let tree = parse_expression("a.b + 1").unwrap();
    let mut ctx = EvalContext::new();

    tree.get_value(&mut ctx, &graph()).unwrap();
    assert_eq!(ctx.pool().allocated(), 0);
}

#[test]
fn test_manual_push_pop_is_lifo() {
    let tree = parse_expression("a").unwrap();
    let mut ctx = EvalContext::new();
    let ids: Vec<_> = (0..4)
        .map(|_| ctx.pool_mut().create(tree.root(), Value::Null, false))
        .collect();

    for id in &ids {
        ctx.push_evaluation(*id);
    }
    assert_eq!(ctx.evaluation_depth(), 4);
    assert_eq!(ctx.root_evaluation(), Some(ids[0]));

    for id in ids.iter().rev() {
        assert_eq!(ctx.pop_evaluation(), Some(*id));
    }
    assert_eq!(ctx.evaluation_depth(), 0);
    assert_eq!(ctx.pop_evaluation(), None);
}

// ═══════════════════════════════════════════════════════════════════════
// Retention and pooling
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_successful_calls_return_every_record() {
    let tree = parse_expression("a.b + 1").unwrap();
    let mut ctx = tracing();

    for _ in 0..3 {
        assert_eq!(tree.get_value(&mut ctx, &graph()).unwrap(), Value::Int(3));
        assert_eq!(ctx.pool().in_use(), 0);
    }
    // Add, Chain, a, b, Const: one record each, reused on every call.
    assert_eq!(ctx.pool().allocated(), 5);
    assert_eq!(ctx.pool().available(), 5);
}

#[test]
fn test_keep_last_retains_exactly_one_trace() {
    let tree = parse_expression("a.b + 1").unwrap();
    let mut ctx = tracing().with_keep_last_evaluation(true);

    tree.get_value(&mut ctx, &graph()).unwrap();
    let first = ctx.last_evaluation().unwrap();
    assert_eq!(ctx.pool().in_use(), 5);

    tree.get_value(&mut ctx, &graph()).unwrap();
    let last = ctx.last_evaluation().unwrap();
    assert_eq!(ctx.pool().in_use(), 5);

    let record = ctx.evaluation(last).unwrap();
    assert_eq!(record.kind(), NodeKind::Add);
    assert_eq!(record.parent(), None);
    assert_eq!(record.result(), Some(&Value::Int(3)));
    assert_eq!(record.children().len(), 2);
    // The first trace was still held while the second was recorded.
    assert_ne!(first, last);
    assert!(ctx.evaluation(first).is_none());

    ctx.clear_last_evaluation();
    assert_eq!(ctx.last_evaluation(), None);
    assert_eq!(ctx.pool().in_use(), 0);
}

#[test]
fn test_failed_trace_is_retained() {
    let tree = parse_expression("a.missing").unwrap();
    let mut ctx = tracing();

    let err = tree.get_value(&mut ctx, &graph()).unwrap_err();
    assert!(matches!(err, EvalError::NoSuchProperty { .. }));

    let root = ctx.last_evaluation().unwrap();
    let rendered = ctx.render_trace(root).unwrap();
    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.starts_with("get Chain #0"));
    assert!(rendered.contains("failed: No such property `missing` on A"));

    let record = ctx.evaluation(root).unwrap();
    assert_eq!(record.failure(), Some("No such property `missing` on A"));
    assert_eq!(ctx.pool().in_use(), 3);
    assert_eq!(ctx.evaluation_depth(), 0);

    // A later successful call replaces nothing unless it keeps its trace.
    parse_expression("a.b").unwrap().get_value(&mut ctx, &graph()).unwrap();
    assert_eq!(ctx.last_evaluation(), Some(root));

    ctx.reset();
    assert_eq!(ctx.last_evaluation(), None);
    assert_eq!(ctx.pool().in_use(), 0);
}

#[test]
fn test_setter_records() {
    let tree = parse_expression("a.b").unwrap();
    let mut ctx = tracing().with_keep_last_evaluation(true);
    let root = graph();

    tree.set_value(&mut ctx, &root, &Value::Int(7)).unwrap();
    let last = ctx.last_evaluation().unwrap();
    let record = ctx.evaluation(last).unwrap();
    assert!(record.is_setter());
    assert_eq!(record.result(), None);

    let children: Vec<bool> = record
        .children()
        .iter()
        .filter_map(|id| ctx.evaluation(*id))
        .map(Evaluation::is_setter)
        .collect();
    assert_eq!(children, vec![false, true]);
}

#[test]
fn test_failure_points_at_the_failing_record() {
    let tree = parse_expression("a.missing").unwrap();
    let mut ctx = tracing();

    tree.get_value(&mut ctx, &graph()).unwrap_err();
    let failed = ctx.failed_evaluation().unwrap();
    let record = ctx.evaluation(failed).unwrap();
    assert_eq!(record.kind(), NodeKind::Property);
    assert_eq!(Some(record.node()), tree.root().child(1).map(|n| n.id()));
    assert_eq!(record.failure(), Some("No such property `missing` on A"));
    assert_eq!(record.parent(), ctx.last_evaluation());

    // The sibling that succeeded is not blamed.
    let root = ctx.evaluation(ctx.last_evaluation().unwrap()).unwrap();
    let first = ctx.evaluation(root.children()[0]).unwrap();
    assert_eq!(first.failure(), None);

    ctx.clear_last_evaluation();
    assert_eq!(ctx.failed_evaluation(), None);
}

#[test]
fn test_failed_evaluation_follows_the_retained_trace() {
    let failing = parse_expression("a.b / 0").unwrap();
    let mut ctx = tracing().with_keep_last_evaluation(true);

    failing.get_value(&mut ctx, &graph()).unwrap_err();
    let failed = ctx.failed_evaluation().unwrap();
    assert_eq!(ctx.evaluation(failed).map(Evaluation::kind), Some(NodeKind::Divide));
    assert_eq!(ctx.last_evaluation(), Some(failed));

    parse_expression("a.b").unwrap().get_value(&mut ctx, &graph()).unwrap();
    assert!(ctx.last_evaluation().is_some());
    assert_eq!(ctx.failed_evaluation(), None);
}

#[test]
fn test_no_failed_evaluation_without_tracing() {
    let mut ctx = EvalContext::new();
    parse_expression("a.missing")
        .unwrap()
        .get_value(&mut ctx, &graph())
        .unwrap_err();
    assert_eq!(ctx.failed_evaluation(), None);
}
