//! Native functions bound into the global environment.
//!
//! Every builtin is a plain `fn(&mut Interpreter, &[Value])`; arity is
//! checked by the caller before the function runs.

mod channel;
mod concurrency;
mod mutex;

pub use channel::ChannelTable;
pub use mutex::MutexTable;

use able_ir::StringInterner;

use crate::errors::{channel_would_block, task_cancelled, type_mismatch};
use crate::task::{TaskFlags, TaskHandle};
use crate::value::{BuiltinFn, BuiltinFunction};
use crate::{ControlAction, Environment, EvalError, EvalResult, Interpreter, Mutability, Value};

const BUILTINS: &[(&str, usize, BuiltinFn)] = &[
    ("print", 1, concurrency::print),
    ("proc_yield", 0, concurrency::proc_yield),
    ("proc_cancelled", 0, concurrency::proc_cancelled),
    ("proc_flush", 0, concurrency::proc_flush),
    ("proc_pending_tasks", 0, concurrency::proc_pending_tasks),
    ("__able_channel_new", 1, channel::channel_new),
    ("__able_channel_send", 2, channel::channel_send),
    ("__able_channel_receive", 1, channel::channel_receive),
    ("__able_channel_try_send", 2, channel::channel_try_send),
    ("__able_channel_try_receive", 1, channel::channel_try_receive),
    ("__able_channel_close", 1, channel::channel_close),
    ("__able_channel_is_closed", 1, channel::channel_is_closed),
    ("__able_mutex_new", 0, mutex::mutex_new),
    ("__able_mutex_lock", 1, mutex::mutex_lock),
    ("__able_mutex_unlock", 1, mutex::mutex_unlock),
];

/// Bind every builtin into `globals`.
pub fn register_builtins(globals: &Environment, interner: &StringInterner) {
    for &(name, arity, func) in BUILTINS {
        globals.define(
            interner.intern(name),
            Value::Builtin(BuiltinFunction { name, arity, func }),
            Mutability::Immutable,
        );
    }
}

/// Integer handle argument of a channel or mutex builtin.
fn handle_arg(value: &Value) -> Result<i64, EvalError> {
    value
        .as_int()
        .ok_or_else(|| type_mismatch("Int", value.type_name()))
}

/// Park `task` until a waker schedules it, and suspend.
fn park_current(task: &TaskHandle) -> EvalResult {
    task.set_flag(TaskFlags::PARKED, true);
    Err(ControlAction::Yield)
}

/// Operations on handle `0` never complete; only cancellation ends them.
fn block_on_nil_handle(interp: &Interpreter, operation: &'static str) -> EvalResult {
    let Some(task) = interp.current_task() else {
        return Err(channel_would_block(operation).into());
    };
    if task.cancel_requested() {
        return Err(task_cancelled(task.kind()).into());
    }
    park_current(&task)
}
