//! Able Eval - Resumable evaluator and cooperative concurrency runtime.
//!
//! # Architecture
//!
//! The evaluator is a recursive tree walker over the `able_ir` arena that
//! can suspend in the middle of nested control flow and later resume at
//! the same point:
//!
//! - `ControlAction`: unwinding signals (yield, return, break, raise, ...)
//! - `ContinuationFrames`: per-task / per-generator saved progress of
//!   suspended blocks, conditionals, loops, and matches
//! - `Scheduler`: FIFO queue of task runners with a step budget
//! - `TaskHandle`: proc and future lifecycle
//! - `GeneratorHandle`: pull-based iterators built from iterator literals
//! - channel and mutex builtins that block by parking the calling task
//!
//! Everything runs on one thread. Concurrency means interleaving at yield
//! points, in a deterministic order.

mod async_context;
mod builtins;
mod continuation;
mod environment;
pub mod errors;
pub mod exec;
mod generator;
mod interpreter;
mod operators;
mod print_handler;
mod scheduler;
mod signal;
mod task;
mod user_methods;
mod value;

pub use builtins::{register_builtins, ChannelTable, MutexTable};
pub use continuation::{ContinuationFrames, FramesRef};
pub use environment::{AssignError, Environment, LocalScope, Mutability, Scope, WeakScope};
pub use errors::{EvalError, EvalErrorKind};
pub use generator::{GeneratorFlags, GeneratorHandle, GeneratorState, WeakGenerator};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use operators::{evaluate_binary, evaluate_unary};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use scheduler::{Scheduler, SchedulerConfig, DEFAULT_MAX_STEPS};
pub use signal::{ControlAction, EvalResult};
pub use task::{ProcError, TaskFlags, TaskHandle, TaskKind, TaskState, TaskStatus};
pub use user_methods::UserMethodRegistry;
pub use value::{
    BuiltinFn, BuiltinFunction, DisplayValue, ErrorValue, FunctionValue, Heap, RangeValue,
    StructValue, Value,
};

#[cfg(test)]
mod tests;
