//! Lexical environments.
//!
//! An `Environment` is a cheap handle to one scope in a parent chain.
//! Handles are cloned freely: resumable control-flow state keeps the
//! scopes it created so a resumed block sees the bindings it made before
//! suspending.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use able_ir::Name;
use rustc_hash::FxHashMap;

use crate::Value;

/// Whether a binding can be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Immutable,
}

impl Mutability {
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

/// Failure mode of `Environment::assign`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    Immutable,
    Undefined,
}

/// Single-threaded shared mutable cell.
///
/// Wraps `Rc<RefCell<T>>`; used for scopes and for the interpreter's
/// long-lived runtime objects (task handles, generators, continuation
/// frames). The interpreter never runs on more than one thread.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Non-owning handle, used where an owning one would form a cycle.
    #[inline]
    pub fn downgrade(&self) -> WeakScope<T> {
        WeakScope(Rc::downgrade(&self.0))
    }
}

/// Weak counterpart of `LocalScope`.
pub struct WeakScope<T>(Weak<RefCell<T>>);

impl<T> WeakScope<T> {
    #[inline]
    pub fn upgrade(&self) -> Option<LocalScope<T>> {
        self.0.upgrade().map(LocalScope)
    }
}

impl<T> Clone for WeakScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        WeakScope(Weak::clone(&self.0))
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

#[derive(Clone)]
struct Binding {
    value: Value,
    mutability: Mutability,
}

/// Bindings of one scope plus a link to its parent.
#[derive(Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Binding>,
    parent: Option<Environment>,
}

/// Handle to a scope chain.
#[derive(Clone, Default)]
pub struct Environment(LocalScope<Scope>);

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Environment::default()
    }

    /// A fresh scope whose parent is `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Environment(LocalScope::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(self.clone()),
        }))
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: Name, value: Value, mutability: Mutability) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name, Binding { value, mutability });
    }

    /// Nearest binding of `name` along the parent chain.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if let Some(binding) = scope.bindings.get(&name) {
                    return Some(binding.value.clone());
                }
                scope.parent.clone()
            };
            current = parent?;
        }
    }

    /// Overwrite the nearest binding of `name`.
    pub fn assign(&self, name: Name, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(&name) {
                    if !binding.mutability.is_mutable() {
                        return Err(AssignError::Immutable);
                    }
                    binding.value = value;
                    return Ok(());
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(AssignError::Undefined),
            }
        }
    }

    /// Whether `name` is bound directly in this scope.
    pub fn has_local(&self, name: Name) -> bool {
        self.0.borrow().bindings.contains_key(&name)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        f.debug_struct("Environment")
            .field("bindings", &scope.bindings.len())
            .field("has_parent", &scope.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
