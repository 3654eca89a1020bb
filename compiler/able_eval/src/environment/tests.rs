use super::*;
use able_ir::SharedInterner;
use pretty_assertions::assert_eq;

#[test]
fn test_define_lookup() {
    let interner = SharedInterner::new();
    let x = interner.intern("x");

    let env = Environment::new();
    env.define(x, Value::Int(42), Mutability::Immutable);
    assert_eq!(env.lookup(x), Some(Value::Int(42)));
}

#[test]
fn test_child_shadows_parent() {
    let interner = SharedInterner::new();
    let x = interner.intern("x");

    let parent = Environment::new();
    parent.define(x, Value::Int(1), Mutability::Mutable);
    let child = parent.child();
    child.define(x, Value::Int(2), Mutability::Mutable);

    assert_eq!(child.lookup(x), Some(Value::Int(2)));
    assert_eq!(parent.lookup(x), Some(Value::Int(1)));
}

#[test]
fn test_assign_walks_to_defining_scope() {
    let interner = SharedInterner::new();
    let x = interner.intern("x");

    let parent = Environment::new();
    parent.define(x, Value::Int(1), Mutability::Mutable);
    let grandchild = parent.child().child();

    assert_eq!(grandchild.assign(x, Value::Int(5)), Ok(()));
    assert_eq!(parent.lookup(x), Some(Value::Int(5)));
}

#[test]
fn test_assign_errors() {
    let interner = SharedInterner::new();
    let x = interner.intern("x");
    let y = interner.intern("y");

    let env = Environment::new();
    env.define(x, Value::Int(1), Mutability::Immutable);

    assert_eq!(env.assign(x, Value::Int(2)), Err(AssignError::Immutable));
    assert_eq!(env.assign(y, Value::Int(2)), Err(AssignError::Undefined));
}

#[test]
fn test_clones_share_scope() {
    let interner = SharedInterner::new();
    let x = interner.intern("x");

    let env = Environment::new();
    let alias = env.clone();
    alias.define(x, Value::Bool(true), Mutability::Mutable);

    assert!(env.ptr_eq(&alias));
    assert!(env.has_local(x));
    assert!(!env.child().has_local(x));
}
