//! Task-facing builtins.

use crate::errors::{outside_task, yield_outside_task};
use crate::task::TaskKind;
use crate::{ControlAction, EvalResult, Interpreter, Value};

/// `proc_yield()`
///
/// Suspends the running task. The call is invoked again when the task
/// resumes; that second invocation returns instead of suspending.
pub(super) fn proc_yield(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    if interp.current_task().is_none() {
        return Err(yield_outside_task().into());
    }
    let Some(frames) = interp.active_frames() else {
        return Err(yield_outside_task().into());
    };
    if frames.borrow().is_resuming_call() {
        return Ok(Value::Nil);
    }
    Err(ControlAction::Yield)
}

/// `proc_cancelled()`: whether the running proc was asked to stop.
/// Always false in a future.
pub(super) fn proc_cancelled(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    let Some(task) = interp.current_task() else {
        return Err(outside_task("proc_cancelled").into());
    };
    Ok(Value::Bool(
        task.kind() == TaskKind::Proc && task.cancel_requested(),
    ))
}

/// `proc_flush()`: run queued jobs up to the step budget.
pub(super) fn proc_flush(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    let ran = interp.run_pending();
    tracing::trace!(ran, "proc_flush");
    Ok(Value::Nil)
}

/// `proc_pending_tasks()`
pub(super) fn proc_pending_tasks(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    let pending = i64::try_from(interp.scheduler.pending()).unwrap_or(i64::MAX);
    Ok(Value::Int(pending))
}

/// `print(value)`
pub(super) fn print(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let text = interp.display(&args[0]);
    interp.print_handler.println(&text);
    Ok(Value::Void)
}
