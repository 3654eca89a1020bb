//! Proc and future lifecycle.
//!
//! A task is driven by its runner job. Each run pushes the task onto the
//! async context stack and its frames onto the continuation stack, then
//! evaluates the body. A yield re-enqueues the runner; any other outcome
//! settles the task.

use std::rc::Rc;

use able_ir::{ExprId, Name};

use super::Interpreter;
use crate::errors::{self_await, task_cancelled};
use crate::task::{ProcError, TaskFlags, TaskHandle, TaskKind, TaskStatus};
use crate::{ControlAction, Environment, EvalResult, Value};

impl Interpreter {
    /// `proc expr`: created idle, started on first access or cancel.
    pub(super) fn create_proc(&mut self, body: ExprId, env: &Environment) -> TaskHandle {
        self.new_task(TaskKind::Proc, body, env)
    }

    /// `spawn expr`: enqueued immediately.
    pub(super) fn create_future(&mut self, body: ExprId, env: &Environment) -> TaskHandle {
        let task = self.new_task(TaskKind::Future, body, env);
        self.schedule_task(&task);
        task
    }

    fn new_task(&mut self, kind: TaskKind, body: ExprId, env: &Environment) -> TaskHandle {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let task = TaskHandle::new(id, kind, body, env.clone());
        let runner_task = task.clone();
        task.set_runner(Rc::new(move |interp: &mut Interpreter| {
            runner_task.set_flag(TaskFlags::QUEUED, false);
            interp.run_task(&runner_task);
        }));
        tracing::debug!(id, %kind, "task created");
        task
    }

    /// Enqueue the task's runner unless it is already queued or settled.
    pub(crate) fn schedule_task(&mut self, task: &TaskHandle) {
        if !task.is_pending() || task.has_flag(TaskFlags::QUEUED) {
            return;
        }
        let Some(runner) = task.runner() else {
            return;
        };
        task.set_flag(TaskFlags::QUEUED, true);
        self.scheduler.enqueue(runner);
    }

    /// Drive the task until it settles or yields.
    #[tracing::instrument(level = "debug", skip_all, fields(id = task.id(), kind = %task.kind()))]
    pub(crate) fn run_task(&mut self, task: &TaskHandle) {
        if !task.is_pending() || task.has_flag(TaskFlags::EVALUATING) {
            return;
        }
        let kind = task.kind();
        if task.cancel_requested() && !task.has_flag(TaskFlags::STARTED) {
            tracing::debug!(id = task.id(), "task cancelled before start");
            task.settle(TaskStatus::Cancelled(ProcError::new(format!("{kind} cancelled"))));
            return;
        }

        task.set_flag(TaskFlags::STARTED | TaskFlags::EVALUATING, true);
        // A blocked builtin re-parks the task if it still cannot proceed.
        task.set_flag(TaskFlags::PARKED, false);
        let frames = task.frames();
        frames.borrow_mut().reset_depth();
        self.async_stack.push(task.clone());
        self.continuations.push(frames);

        // Labels of whoever drove this task are not in scope for its body.
        let breakpoints = std::mem::take(&mut self.breakpoints);
        let (body, env) = task.body();
        let result = self.eval(body, &env);
        self.breakpoints = breakpoints;

        self.continuations.pop();
        self.async_stack.pop();
        task.set_flag(TaskFlags::EVALUATING, false);

        let status = match result {
            Ok(value) | Err(ControlAction::Return(value)) => {
                if task.cancel_requested() {
                    TaskStatus::Cancelled(ProcError::new(format!("{kind} cancelled")))
                } else {
                    TaskStatus::Resolved(value)
                }
            }
            Err(ControlAction::Yield) => {
                if !task.has_flag(TaskFlags::PARKED) {
                    self.schedule_task(task);
                }
                return;
            }
            Err(ControlAction::Raise(raised)) => TaskStatus::Failed(ProcError::from_raised(
                &raised,
                self.names.proc_error,
                &self.interner,
            )),
            Err(ControlAction::Error(e)) => {
                if task.cancel_requested() {
                    TaskStatus::Cancelled(ProcError::new(e.message))
                } else {
                    TaskStatus::Failed(ProcError::new(e.message))
                }
            }
            Err(other) => TaskStatus::Failed(ProcError::new(format!(
                "unexpected {} escaped {kind} body",
                other.describe()
            ))),
        };
        tracing::debug!(id = task.id(), status = status.label(), "task settled");
        task.settle(status);
    }

    /// `handle.cancel()`
    pub(crate) fn cancel_task(&mut self, task: &TaskHandle) {
        if !task.is_pending() {
            return;
        }
        task.set_flag(TaskFlags::CANCEL_REQUESTED, true);
        if !task.has_flag(TaskFlags::EVALUATING) {
            self.schedule_task(task);
        }
    }

    /// `handle.value`
    pub(crate) fn task_value(&mut self, task: &TaskHandle) -> EvalResult {
        if let Some(current) = self.current_task() {
            if current.ptr_eq(task) {
                return Err(self_await(current.kind()).into());
            }
            if current.cancel_requested() {
                return Err(task_cancelled(current.kind()).into());
            }
            self.drive_if_idle(task);
            if task.is_pending() {
                return Err(ControlAction::Yield);
            }
        } else {
            self.force(task);
        }
        Ok(self.settled_value(task))
    }

    /// `handle.status`
    ///
    /// Outside a task this forces the handle like `value`. Inside a task
    /// an idle handle is driven once and the status reported as is, so a
    /// task can poll another without waiting on it.
    pub(crate) fn task_status_value(&mut self, task: &TaskHandle) -> Value {
        match self.current_task() {
            Some(current) if current.ptr_eq(task) => {}
            Some(_) => self.drive_if_idle(task),
            None => self.force(task),
        }
        let status = self.names.status;
        let variant =
            |name: Name, fields: Vec<Value>| Value::variant(status.proc_status, name, fields);
        match task.status() {
            TaskStatus::Pending => variant(status.pending, Vec::new()),
            TaskStatus::Resolved(_) => variant(status.resolved, Vec::new()),
            TaskStatus::Cancelled(_) => variant(status.cancelled, Vec::new()),
            TaskStatus::Failed(err) => {
                variant(status.failed, vec![err.to_value(self.names.proc_error)])
            }
        }
    }

    fn settled_value(&self, task: &TaskHandle) -> Value {
        let kind = task.kind();
        match task.status() {
            TaskStatus::Resolved(value) => value,
            TaskStatus::Failed(err) => Value::error(
                format!("{kind} failed: {}", err.details),
                Some(err.to_value(self.names.proc_error)),
            ),
            TaskStatus::Cancelled(err) => Value::error(
                err.details.clone(),
                Some(err.to_value(self.names.proc_error)),
            ),
            TaskStatus::Pending => Value::error(format!("{kind} pending"), None),
        }
    }

    /// Run a pending task that nobody else is going to run.
    fn drive_if_idle(&mut self, task: &TaskHandle) {
        if task.is_pending()
            && !task.has_flag(TaskFlags::QUEUED)
            && !task.has_flag(TaskFlags::EVALUATING)
            && !task.has_flag(TaskFlags::PARKED)
        {
            self.run_task(task);
        }
    }

    /// Drive `task` to a terminal status from outside any task.
    fn force(&mut self, task: &TaskHandle) {
        self.drive_if_idle(task);
        if !task.is_pending() || !self.scheduler.begin_drain() {
            return;
        }
        let max_steps = self.scheduler.config().max_steps;
        let mut steps = 0;
        while task.is_pending() && steps < max_steps {
            let Some(job) = self.scheduler.pop() else {
                break;
            };
            job(self);
            steps += 1;
        }
        self.scheduler.end_drain();
        tracing::trace!(id = task.id(), steps, settled = !task.is_pending(), "forced access");
    }

    /// Run up to `limit` queued jobs. Returns how many ran.
    pub(crate) fn drain_scheduler(&mut self, limit: usize) -> usize {
        if !self.scheduler.begin_drain() {
            return 0;
        }
        let mut steps = 0;
        while steps < limit {
            let Some(job) = self.scheduler.pop() else {
                break;
            };
            job(self);
            steps += 1;
        }
        self.scheduler.end_drain();
        steps
    }

    /// Run the scheduler until its queue is empty or `max_steps` jobs ran.
    pub fn run_pending(&mut self) -> usize {
        let max_steps = self.scheduler.config().max_steps;
        self.drain_scheduler(max_steps)
    }
}
