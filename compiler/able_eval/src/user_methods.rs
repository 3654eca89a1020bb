//! User-defined method registry.
//!
//! Methods are keyed by `(type name, method name)` and stored as callable
//! values. The receiver is passed as the first argument. `for` loops use
//! this registry to find `iterator`, `next`, and `close` on user structs.

use able_ir::Name;
use rustc_hash::FxHashMap;

use crate::Value;

#[derive(Clone, Debug, Default)]
pub struct UserMethodRegistry {
    methods: FxHashMap<(Name, Name), Value>,
}

impl UserMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callable` as `type_name.method_name`, replacing any
    /// previous definition.
    pub fn register(&mut self, type_name: Name, method_name: Name, callable: Value) {
        self.methods.insert((type_name, method_name), callable);
    }

    pub fn lookup(&self, type_name: Name, method_name: Name) -> Option<&Value> {
        self.methods.get(&(type_name, method_name))
    }

    pub fn has_method(&self, type_name: Name, method_name: Name) -> bool {
        self.methods.contains_key(&(type_name, method_name))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Merge another registry into this one. Later definitions win.
    pub fn merge(&mut self, other: UserMethodRegistry) {
        self.methods.extend(other.methods);
    }
}
