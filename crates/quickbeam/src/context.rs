//! Evaluation context configuration

use std::sync::Arc;

use crate::method::MethodAccessor;
use crate::trace::{EvaluationId, EvaluationPool};
use crate::tree::NodeId;
use crate::value::Value;

/// Configuration and state for one evaluation session.
///
/// This is passed through all evaluation calls. It is owned by a single
/// caller at a time; evaluating the same tree from several threads means
/// one context per thread.
///
/// # Example
///
/// ```
/// use quickbeam::{EvalContext, Value};
///
/// let ctx = EvalContext::new()
///     .with_root(Value::Int(1))
///     .with_trace_evaluations(true);
/// assert!(ctx.trace_evaluations());
/// assert!(!ctx.keep_last_evaluation());
/// ```
#[derive(Debug, Default)]
pub struct EvalContext {
    /// Root object of the navigated graph (method arguments evaluate against it)
    root: Value,

    /// Object being navigated by the node currently executing
    current_object: Option<Value>,

    /// Node currently executing
    current_node: Option<NodeId>,

    /// Whether to record an evaluation trace
    trace_evaluations: bool,

    /// Whether to retain the trace of the last top-level call
    pub(crate) keep_last_evaluation: bool,

    /// Gateway used by method-call nodes
    method_accessor: Option<Arc<dyn MethodAccessor>>,

    pub(crate) pool: EvaluationPool,
    pub(crate) current_evaluation: Option<EvaluationId>,
    pub(crate) root_evaluation: Option<EvaluationId>,
    pub(crate) last_evaluation: Option<EvaluationId>,
    pub(crate) failed_evaluation: Option<EvaluationId>,
    pub(crate) pending_failure: Option<EvaluationId>,
}

impl EvalContext {
    /// Create a context with default settings: null root, tracing off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root object (builder pattern).
    pub fn with_root(mut self, root: impl Into<Value>) -> Self {
        self.root = root.into();
        self
    }

    /// Enable or disable evaluation tracing (builder pattern).
    pub fn with_trace_evaluations(mut self, trace: bool) -> Self {
        self.trace_evaluations = trace;
        self
    }

    /// Keep the trace of the last top-level call (builder pattern).
    pub fn with_keep_last_evaluation(mut self, keep: bool) -> Self {
        self.keep_last_evaluation = keep;
        self
    }

    /// Install the method invocation gateway (builder pattern).
    pub fn with_method_accessor(mut self, accessor: Arc<dyn MethodAccessor>) -> Self {
        self.method_accessor = Some(accessor);
        self
    }

    /// The root object.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Replace the root object.
    pub fn set_root(&mut self, root: impl Into<Value>) {
        self.root = root.into();
    }

    /// Whether evaluation tracing is on.
    pub fn trace_evaluations(&self) -> bool {
        self.trace_evaluations
    }

    /// Turn evaluation tracing on or off.
    pub fn set_trace_evaluations(&mut self, trace: bool) {
        self.trace_evaluations = trace;
    }

    /// Whether the last top-level trace is retained.
    pub fn keep_last_evaluation(&self) -> bool {
        self.keep_last_evaluation
    }

    /// Retain (or stop retaining) the last top-level trace.
    pub fn set_keep_last_evaluation(&mut self, keep: bool) {
        self.keep_last_evaluation = keep;
    }

    /// The method invocation gateway, if one is installed.
    pub fn method_accessor(&self) -> Option<&Arc<dyn MethodAccessor>> {
        self.method_accessor.as_ref()
    }

    /// Object being navigated by the node that ran most recently.
    pub fn current_object(&self) -> Option<&Value> {
        self.current_object.as_ref()
    }

    /// Record the object being navigated.
    pub fn set_current_object(&mut self, object: Value) {
        self.current_object = Some(object);
    }

    /// The node that ran most recently.
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Record the node being evaluated.
    pub fn set_current_node(&mut self, node: NodeId) {
        self.current_node = Some(node);
    }

    /// The context's record pool.
    pub fn pool(&self) -> &EvaluationPool {
        &self.pool
    }

    /// The context's record pool, mutably.
    pub fn pool_mut(&mut self) -> &mut EvaluationPool {
        &mut self.pool
    }

    /// Forget per-call state so the context can start a new session.
    ///
    /// Every outstanding record, including a retained trace, goes back to
    /// the pool. Configuration, root and gateway are kept.
    pub fn reset(&mut self) {
        self.current_object = None;
        self.current_node = None;
        self.clear_last_evaluation();
        if let Some(root) = self.root_evaluation.take() {
            self.pool.recycle_all(root);
        }
        self.current_evaluation = None;
        self.pending_failure = None;
    }
}
