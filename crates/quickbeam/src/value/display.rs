//! Display and Debug implementations for Value

use std::cell::RefCell;
use std::fmt;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = RefCell::new(Vec::new());
        fmt::Debug::fmt(&Guarded { value: self, seen: &seen }, f)
    }
}

/// Debug view of a value that prints `<cycle>` for an object already
/// being printed further up.
struct Guarded<'a> {
    value: &'a Value,
    seen: &'a RefCell<Vec<usize>>,
}

impl Guarded<'_> {
    fn nested<'v>(&'v self, value: &'v Value) -> Guarded<'v> {
        Guarded {
            value,
            seen: self.seen,
        }
    }
}

impl fmt::Debug for Guarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::List(items) => f
                .debug_list()
                .entries(items.iter().map(|item| self.nested(item)))
                .finish(),
            Value::Object(object) => {
                let addr = object.addr();
                if self.seen.borrow().contains(&addr) {
                    return f.write_str("<cycle>");
                }
                let object = object.snapshot();
                self.seen.borrow_mut().push(addr);
                let mut map = f.debug_struct(&object.type_name);
                for (name, value) in &object.fields {
                    map.field(name, &self.nested(value));
                }
                let result = map.finish();
                self.seen.borrow_mut().pop();
                result
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Strings display without quotes
            Value::String(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}
