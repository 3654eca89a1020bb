use super::*;
use able_ir::ExprId;
use pretty_assertions::assert_eq;

use crate::task::TaskKind;
use crate::{Environment, EvalErrorKind};

fn task(id: u64) -> TaskHandle {
    TaskHandle::new(id, TaskKind::Proc, ExprId::new(0), Environment::new())
}

#[test]
fn handles_start_at_one() {
    let mut table = MutexTable::default();
    assert!(table.is_empty());
    assert_eq!(table.create(), 1);
    assert_eq!(table.create(), 2);
    assert_eq!(table.len(), 2);
}

#[test]
fn unknown_handle_is_rejected() {
    let mut table = MutexTable::default();
    let err = table.get(3).err().unwrap();
    assert_eq!(err.kind, EvalErrorKind::InvalidMutexHandle);
}

#[test]
fn releasing_unlocked_mutex_is_a_no_op() {
    let mut table = MutexTable::default();
    let handle = table.create();
    assert!(table.release(handle).unwrap().is_none());
    assert!(!table.get(handle).unwrap().locked);
}

#[test]
fn release_hands_off_to_oldest_waiter() {
    let mut table = MutexTable::default();
    let handle = table.create();
    let first = task(4);
    let second = task(6);
    {
        let state = table.get(handle).unwrap();
        state.locked = true;
        state.waiters.extend([first.clone(), second.clone()]);
    }

    let next = table.release(handle).unwrap().unwrap();

    assert!(next.ptr_eq(&first));
    let state = table.get(handle).unwrap();
    assert!(state.locked);
    assert_eq!(state.owner, Some(4));
    assert_eq!(state.granted, Some(4));
    assert_eq!(state.waiters.len(), 1);
}

#[test]
fn release_without_waiters_unlocks() {
    let mut table = MutexTable::default();
    let handle = table.create();
    {
        let state = table.get(handle).unwrap();
        state.locked = true;
        state.owner = Some(1);
    }

    assert!(table.release(handle).unwrap().is_none());

    let state = table.get(handle).unwrap();
    assert!(!state.locked);
    assert_eq!(state.owner, None);
}
