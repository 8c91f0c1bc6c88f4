//! Per-node constant cache
//!
//! The cache is the only tree state written during evaluation. Two
//! evaluators reaching a fresh node at the same time may both compute its
//! constant; the first stored value wins and is the only one ever
//! observed. This is sound only because constant bodies are pure: a body
//! that reports itself constant must return the same value for every
//! context and source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::value::Value;

#[derive(Debug, Default)]
pub(crate) struct ConstantCache {
    calculated: AtomicBool,
    value: OnceLock<Value>,
}

impl ConstantCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim the one constancy check. Returns false if it was already claimed.
    pub(crate) fn begin(&self) -> bool {
        !self.calculated.swap(true, Ordering::AcqRel)
    }

    /// Publish the constant. A value stored earlier by another evaluator is kept.
    pub(crate) fn store(&self, value: Value) -> &Value {
        self.value.get_or_init(|| value)
    }

    pub(crate) fn get(&self) -> Option<&Value> {
        self.value.get()
    }

    pub(crate) fn is_calculated(&self) -> bool {
        self.calculated.load(Ordering::Acquire)
    }
}
