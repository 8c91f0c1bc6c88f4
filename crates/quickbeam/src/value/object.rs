//! Object values: named, ordered, mutable fields behind a shared handle

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::Value;

/// A record with a type name and fields in insertion order.
///
/// Uses IndexMap so field iteration (and display) is predictable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    /// The object's type name (e.g., "Point", "Person")
    pub type_name: String,

    /// The object's fields in insertion order
    pub fields: IndexMap<String, Value>,
}

impl ObjectValue {
    /// Create an object with no fields
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field (builder pattern)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Shared handle to an [`ObjectValue`].
///
/// Cloning the handle shares the object. A poisoned lock is recovered
/// rather than propagated: field writes are single assignments and
/// cannot leave an object half-updated.
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<RwLock<ObjectValue>>);

impl ObjectRef {
    /// Wrap an object in a new shared handle
    pub fn new(object: ObjectValue) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Borrow the object for reading
    pub fn read(&self) -> RwLockReadGuard<'_, ObjectValue> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow the object for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, ObjectValue> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The object's type name
    pub fn type_name(&self) -> String {
        self.read().type_name.clone()
    }

    /// Read a field, cloning its value
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().fields.get(name).cloned()
    }

    /// Write a field, returning the previous value
    pub fn set(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.write().fields.insert(name.into(), value)
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the shared object, for cycle detection.
    pub(super) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copy of the object taken under a short-lived read guard.
    ///
    /// Recursive walks work on snapshots so no guard is held while a
    /// nested (possibly the same) object is locked.
    pub(super) fn snapshot(&self) -> ObjectValue {
        self.read().clone()
    }

    /// Structural equality. A pair of objects already under comparison
    /// further up the walk counts as equal, so cyclic graphs terminate.
    pub(super) fn eq_within(&self, other: &ObjectRef, pending: &mut Vec<(usize, usize)>) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let pair = (self.addr(), other.addr());
        if pending.contains(&pair) {
            return true;
        }

        let (left, right) = (self.snapshot(), other.snapshot());
        if left.type_name != right.type_name || left.fields.len() != right.fields.len() {
            return false;
        }
        pending.push(pair);
        let equal = left.fields.iter().all(|(name, value)| {
            right
                .fields
                .get(name)
                .is_some_and(|theirs| value.eq_within(theirs, pending))
        });
        pending.pop();
        equal
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.eq_within(other, &mut Vec::new())
    }
}
