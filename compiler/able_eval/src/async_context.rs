//! Stack of tasks whose bodies are on the Rust stack.
//!
//! The top entry answers "which task is running": builtins consult it to
//! decide between yielding and failing, and cancellation checks read its
//! flags. A task reading another handle's `.value` can drive that task
//! directly, so the stack may hold more than one entry.

use crate::task::TaskHandle;

#[derive(Default)]
pub(crate) struct AsyncContextStack {
    tasks: Vec<TaskHandle>,
}

impl AsyncContextStack {
    pub(crate) fn push(&mut self, task: TaskHandle) {
        self.tasks.push(task);
    }

    pub(crate) fn pop(&mut self) -> Option<TaskHandle> {
        self.tasks.pop()
    }

    pub(crate) fn current(&self) -> Option<&TaskHandle> {
        self.tasks.last()
    }
}
