//! Mutex builtins.
//!
//! `unlock` hands the lock straight to the oldest waiter, so waiters
//! acquire in the order they queued and a task that never waited cannot
//! barge in between.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::{block_on_nil_handle, handle_arg, park_current};
use crate::errors::{invalid_mutex_handle, mutex_already_locked, nil_mutex_lock, task_cancelled};
use crate::task::TaskHandle;
use crate::{EvalError, EvalResult, Interpreter, Value};

#[derive(Default)]
pub(crate) struct MutexState {
    locked: bool,
    /// Owning task id; `None` when locked from outside any task.
    owner: Option<u64>,
    waiters: VecDeque<TaskHandle>,
    /// Waiter the lock was handed to that has not resumed yet.
    granted: Option<u64>,
}

pub struct MutexTable {
    next_handle: i64,
    mutexes: FxHashMap<i64, MutexState>,
}

impl Default for MutexTable {
    fn default() -> Self {
        MutexTable {
            next_handle: 1,
            mutexes: FxHashMap::default(),
        }
    }
}

impl MutexTable {
    pub(crate) fn create(&mut self) -> i64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.mutexes.insert(handle, MutexState::default());
        handle
    }

    fn get(&mut self, handle: i64) -> Result<&mut MutexState, EvalError> {
        self.mutexes.get_mut(&handle).ok_or_else(invalid_mutex_handle)
    }

    pub fn len(&self) -> usize {
        self.mutexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutexes.is_empty()
    }

    /// Release `handle`. Returns the waiter that now owns it.
    fn release(&mut self, handle: i64) -> Result<Option<TaskHandle>, EvalError> {
        let state = self.get(handle)?;
        if !state.locked {
            return Ok(None);
        }
        match state.waiters.pop_front() {
            Some(next) => {
                state.owner = Some(next.id());
                state.granted = Some(next.id());
                Ok(Some(next))
            }
            None => {
                state.locked = false;
                state.owner = None;
                Ok(None)
            }
        }
    }
}

/// `__able_mutex_new()`
pub(super) fn mutex_new(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    Ok(Value::Int(interp.mutexes.create()))
}

/// `__able_mutex_lock(handle)`
pub(super) fn mutex_lock(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    let current = interp.current_task();
    if handle == 0 {
        if current.is_none() {
            return Err(nil_mutex_lock().into());
        }
        return block_on_nil_handle(interp, "lock");
    }
    let state = interp.mutexes.get(handle)?;

    let Some(task) = current else {
        if state.locked {
            return Err(mutex_already_locked().into());
        }
        state.locked = true;
        state.owner = None;
        return Ok(Value::Nil);
    };

    if state.granted == Some(task.id()) {
        state.granted = None;
        return Ok(Value::Nil);
    }
    if task.cancel_requested() {
        state.waiters.retain(|t| !t.ptr_eq(&task));
        return Err(task_cancelled(task.kind()).into());
    }
    if !state.locked {
        state.locked = true;
        state.owner = Some(task.id());
        return Ok(Value::Nil);
    }
    if !state.waiters.iter().any(|t| t.ptr_eq(&task)) {
        state.waiters.push_back(task.clone());
    }
    tracing::trace!(handle, task = task.id(), owner = ?state.owner, "waiting on mutex");
    park_current(&task)
}

/// `__able_mutex_unlock(handle)`
pub(super) fn mutex_unlock(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return Ok(Value::Nil);
    }
    if let Some(next) = interp.mutexes.release(handle)? {
        tracing::debug!(handle, task = next.id(), "mutex handed off");
        interp.schedule_task(&next);
    }
    Ok(Value::Nil)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
