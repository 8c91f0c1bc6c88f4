//! Value representation for the navigated object graph

mod display;
mod impls;
mod object;

pub use object::{ObjectRef, ObjectValue};

use std::sync::Arc;

/// Runtime value flowing through expression evaluation.
///
/// Scalars are stored inline; strings and lists are immutable and
/// Arc-shared; objects are shared mutable records so that assignment
/// through one path is visible through every other path reaching them.
#[derive(Clone)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean: `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Immutable string
    String(Arc<str>),

    /// Immutable list of values
    List(Arc<Vec<Value>>),

    /// Shared, mutable object with named fields
    Object(ObjectRef),
}

// Values cross threads when a shared tree caches a constant.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
};
