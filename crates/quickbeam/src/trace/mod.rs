//! Evaluation traces
//!
//! With tracing enabled on an [`EvalContext`], every get/set call on a
//! node pushes an [`Evaluation`] record and pops it when the call
//! returns. Records link to the record that was current when they were
//! pushed, so a finished top-level call leaves a tree of records that
//! mirrors the call stack. That tree is recycled into the context's
//! [`EvaluationPool`] unless the call failed or the context keeps its last
//! trace, in which case it stays available as
//! [`last_evaluation`](EvalContext::last_evaluation).

mod pool;

pub use pool::EvaluationPool;

use std::fmt;

use tracing::debug;

use crate::error::EvalError;
use crate::tree::{NodeId, NodeKind, NodeRef};
use crate::value::Value;
use crate::EvalContext;

/// Handle to a record in an [`EvaluationPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationId(u32);

impl EvaluationId {
    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        EvaluationId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// One traced get or set of one node.
#[derive(Debug, Clone)]
pub struct Evaluation {
    node: NodeId,
    kind: NodeKind,
    source: Value,
    setter: bool,
    result: Option<Value>,
    failure: Option<String>,
    parent: Option<EvaluationId>,
    children: Vec<EvaluationId>,
    live: bool,
}

impl Evaluation {
    fn new(node: NodeRef<'_>, source: Value, setter: bool) -> Self {
        Self {
            node: node.id(),
            kind: node.kind(),
            source,
            setter,
            result: None,
            failure: None,
            parent: None,
            children: Vec::new(),
            live: true,
        }
    }

    fn reset(&mut self, node: NodeRef<'_>, source: Value, setter: bool) {
        self.node = node.id();
        self.kind = node.kind();
        self.source = source;
        self.setter = setter;
        self.live = true;
    }

    fn release(&mut self) {
        self.source = Value::Null;
        self.result = None;
        self.failure = None;
        self.parent = None;
        self.children.clear();
        self.live = false;
    }

    /// The evaluated node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Kind of the evaluated node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Source object (for a get) or target object (for a set).
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Whether the record traces a set rather than a get.
    pub fn is_setter(&self) -> bool {
        self.setter
    }

    /// Value produced by a successful get.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Message of the failure raised by this call, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The record that was current when this one was pushed.
    pub fn parent(&self) -> Option<EvaluationId> {
        self.parent
    }

    /// Records pushed while this one was current, in order.
    pub fn children(&self) -> &[EvaluationId] {
        &self.children
    }

    /// Record the produced value.
    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }

    /// Record a failure.
    pub fn set_failure(&mut self, error: &EvalError) {
        self.failure = Some(error.to_string());
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.setter { "set" } else { "get" };
        write!(f, "{} {} {} on {:?}", verb, self.kind, self.node, self.source)?;
        if let Some(result) = &self.result {
            write!(f, " => {:?}", result)?;
        }
        if let Some(failure) = &self.failure {
            write!(f, " failed: {}", failure)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Context trace stack
// ═══════════════════════════════════════════════════════════════════════

impl EvalContext {
    /// Make `id` the current record, as a child of the previous current one.
    ///
    /// The first record pushed onto an empty stack becomes the root record.
    pub fn push_evaluation(&mut self, id: EvaluationId) {
        match self.current_evaluation {
            Some(current) => self.pool.attach(current, id),
            None => {
                self.root_evaluation = Some(id);
                self.pending_failure = None;
            }
        }
        self.current_evaluation = Some(id);
    }

    /// Pop the current record, returning it.
    ///
    /// Popping the root record empties the stack.
    pub fn pop_evaluation(&mut self) -> Option<EvaluationId> {
        let popped = self.current_evaluation?;
        self.current_evaluation = self.pool.get(popped).and_then(Evaluation::parent);
        if self.current_evaluation.is_none() {
            self.root_evaluation = None;
        }
        Some(popped)
    }

    /// The record of the call in progress.
    pub fn current_evaluation(&self) -> Option<EvaluationId> {
        self.current_evaluation
    }

    /// The outermost record of the call in progress.
    pub fn root_evaluation(&self) -> Option<EvaluationId> {
        self.root_evaluation
    }

    /// The retained trace of a finished top-level call.
    ///
    /// Set when the context keeps its last evaluation, and always after a
    /// top-level call that failed.
    pub fn last_evaluation(&self) -> Option<EvaluationId> {
        self.last_evaluation
    }

    /// The record where the retained failed call actually failed.
    ///
    /// This is the innermost record that completed with the error, inside
    /// the trace returned by [`last_evaluation`](Self::last_evaluation).
    /// None when tracing was off or the retained call succeeded.
    pub fn failed_evaluation(&self) -> Option<EvaluationId> {
        self.failed_evaluation
    }

    /// A live record.
    pub fn evaluation(&self, id: EvaluationId) -> Option<&Evaluation> {
        self.pool.get(id)
    }

    /// Number of records on the stack.
    pub fn evaluation_depth(&self) -> usize {
        std::iter::successors(self.current_evaluation, |id| {
            self.pool.get(*id).and_then(Evaluation::parent)
        })
        .count()
    }

    /// Recycle the retained trace, if any.
    pub fn clear_last_evaluation(&mut self) {
        self.failed_evaluation = None;
        if let Some(id) = self.last_evaluation.take() {
            self.pool.recycle_all(id);
        }
    }

    /// Render a record and everything below it, one record per line.
    pub fn render_trace(&self, id: EvaluationId) -> Option<String> {
        self.pool.get(id)?;
        Some(TraceView { ctx: self, id }.to_string())
    }

    /// Pop the record pushed for a finished call and settle its fate.
    pub(crate) fn complete_evaluation(
        &mut self,
        id: EvaluationId,
        outcome: Result<Option<&Value>, &EvalError>,
    ) {
        let popped = self.pop_evaluation();
        debug_assert_eq!(popped, Some(id), "evaluation stack out of balance");

        if let Some(record) = self.pool.get_mut(id) {
            match outcome {
                Ok(Some(value)) => record.set_result(value.clone()),
                Ok(None) => {}
                Err(error) => record.set_failure(error),
            }
        }
        if outcome.is_err() && !self.fails_below(id) {
            self.pending_failure = Some(id);
        }

        // Nested records are settled together with their root.
        if self.root_evaluation.is_some() {
            return;
        }

        let failed = self.pending_failure.take().filter(|_| outcome.is_err());
        if outcome.is_err() || self.keep_last_evaluation {
            if let Some(previous) = self.last_evaluation.replace(id) {
                if previous != id {
                    self.pool.recycle_all(previous);
                }
            }
            self.failed_evaluation = failed;
            if let Err(error) = outcome {
                debug!(%error, "retained failed evaluation trace");
            }
        } else {
            self.pool.recycle_all(id);
        }
    }

    /// Whether the pending failure was recorded inside `id`'s subtree.
    fn fails_below(&self, id: EvaluationId) -> bool {
        std::iter::successors(self.pending_failure, |record| {
            self.pool.get(*record).and_then(Evaluation::parent)
        })
        .any(|record| record == id)
    }
}

/// Indented rendering of the records below `id`.
struct TraceView<'a> {
    ctx: &'a EvalContext,
    id: EvaluationId,
}

impl fmt::Display for TraceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.id, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(record) = self.ctx.pool.get(id) else {
                continue;
            };
            writeln!(f, "{:indent$}{}", "", record, indent = depth * 2)?;
            stack.extend(record.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        Ok(())
    }
}
