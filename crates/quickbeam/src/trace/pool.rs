//! Recycling storage for evaluation records

use super::{Evaluation, EvaluationId};
use crate::tree::NodeRef;
use crate::value::Value;

/// Free-list backed storage for [`Evaluation`] records.
///
/// Records are addressed by [`EvaluationId`]. Recycling a record returns it
/// and its whole child subtree to the free list; the ids stay valid as
/// handles but [`get`](Self::get) reports them as gone until reused.
/// Child lists keep their capacity across reuse, so a context that traces
/// the same shape of expression repeatedly stops allocating.
#[derive(Debug, Default)]
pub struct EvaluationPool {
    records: Vec<Evaluation>,
    free: Vec<EvaluationId>,
}

impl EvaluationPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a record for `node`, reusing a free one if there is one.
    pub fn create(&mut self, node: NodeRef<'_>, source: Value, setter: bool) -> EvaluationId {
        match self.free.pop() {
            Some(id) => {
                self.records[id.index()].reset(node, source, setter);
                id
            }
            None => {
                let id = EvaluationId::from_index(self.records.len());
                self.records.push(Evaluation::new(node, source, setter));
                id
            }
        }
    }

    /// A live record.
    pub fn get(&self, id: EvaluationId) -> Option<&Evaluation> {
        self.records.get(id.index()).filter(|record| record.live)
    }

    /// A live record, mutably.
    pub fn get_mut(&mut self, id: EvaluationId) -> Option<&mut Evaluation> {
        self.records.get_mut(id.index()).filter(|record| record.live)
    }

    /// Return `id` and every record below it to the free list.
    ///
    /// Returns the number of records recycled; zero if `id` was not live.
    pub fn recycle_all(&mut self, id: EvaluationId) -> usize {
        let mut recycled = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(record) = self.get_mut(id) else {
                continue;
            };
            stack.extend(record.children.iter().copied());
            record.release();
            self.free.push(id);
            recycled += 1;
        }
        recycled
    }

    /// Number of records ever allocated.
    pub fn allocated(&self) -> usize {
        self.records.len()
    }

    /// Number of records on the free list.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of records currently handed out.
    pub fn in_use(&self) -> usize {
        self.allocated() - self.available()
    }

    pub(super) fn attach(&mut self, parent: EvaluationId, child: EvaluationId) {
        if let Some(record) = self.get_mut(child) {
            record.parent = Some(parent);
        }
        if let Some(record) = self.get_mut(parent) {
            record.children.push(child);
        }
    }
}
