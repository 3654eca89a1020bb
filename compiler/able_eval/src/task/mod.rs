//! Proc and future handles.
//!
//! A task owns an expression, the environment it closes over, its status,
//! and the continuation frames that let it resume after a yield. The
//! scheduler only ever holds the task's runner job; the job holds the
//! handle until the task reaches a terminal status.
//!
//! # Lifecycle
//!
//! `Pending → Resolved | Failed | Cancelled`. Terminal statuses are final:
//! the runner is released and the frames are cleared on the transition.

use std::fmt;
use std::rc::Rc;

use able_ir::{ExprId, Name, StringInterner};
use bitflags::bitflags;

use crate::continuation::FramesRef;
use crate::{Environment, Interpreter, LocalScope, Value};

/// Which surface construct created a task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// `proc expr`: lazy, cancellable.
    Proc,
    /// `spawn expr`: eagerly scheduled.
    Future,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Proc => write!(f, "Proc"),
            TaskKind::Future => write!(f, "Future"),
        }
    }
}

/// Failure payload carried by failed and cancelled tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcError {
    pub details: String,
}

impl ProcError {
    pub fn new(details: impl Into<String>) -> Self {
        ProcError {
            details: details.into(),
        }
    }

    /// Convert a raised value: a `ProcError` struct keeps its details, an
    /// error value contributes its `ProcError` payload or else its message,
    /// anything else its display.
    pub(crate) fn from_raised(
        value: &Value,
        names: ProcErrorNames,
        interner: &StringInterner,
    ) -> Self {
        match value {
            Value::Struct(s) if s.type_name == names.proc_error => {
                let details = s
                    .get(names.details)
                    .map(|d| d.display(interner).to_string())
                    .unwrap_or_default();
                ProcError::new(details)
            }
            Value::Error(e) => match &e.payload {
                Some(payload @ Value::Struct(s)) if s.type_name == names.proc_error => {
                    ProcError::from_raised(payload, names, interner)
                }
                _ => ProcError::new(e.message.clone()),
            },
            other => ProcError::new(other.display(interner).to_string()),
        }
    }

    /// The user-visible `ProcError { details }` struct.
    pub(crate) fn to_value(&self, names: ProcErrorNames) -> Value {
        Value::struct_value(
            names.proc_error,
            vec![(names.details, Value::string(self.details.clone()))],
        )
    }
}

impl fmt::Display for ProcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

/// Names needed to build and recognize `ProcError` structs.
#[derive(Clone, Copy)]
pub(crate) struct ProcErrorNames {
    pub(crate) proc_error: Name,
    pub(crate) details: Name,
}

/// Observable task state.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskStatus {
    Pending,
    Resolved(Value),
    Failed(ProcError),
    Cancelled(ProcError),
}

impl TaskStatus {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Pending)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Variant name of the user-facing `ProcStatus`.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Resolved(_) => "Resolved",
            TaskStatus::Failed(_) => "Failed",
            TaskStatus::Cancelled(_) => "Cancelled",
        }
    }
}

bitflags! {
    /// Scheduling bookkeeping for one task.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct TaskFlags: u8 {
        /// Body evaluation has begun at least once.
        const STARTED = 1 << 0;
        /// Body is on the Rust stack right now.
        const EVALUATING = 1 << 1;
        const CANCEL_REQUESTED = 1 << 2;
        /// Blocked on a channel or mutex; not rescheduled after yielding.
        /// The waker schedules it again.
        const PARKED = 1 << 3;
        /// Runner is in the scheduler queue.
        const QUEUED = 1 << 4;
    }
}

/// Scheduler callback.
pub(crate) type Job = Rc<dyn Fn(&mut Interpreter)>;

pub struct TaskState {
    pub(crate) id: u64,
    pub(crate) kind: TaskKind,
    pub(crate) body: ExprId,
    pub(crate) env: Environment,
    pub(crate) status: TaskStatus,
    pub(crate) flags: TaskFlags,
    pub(crate) runner: Option<Job>,
    pub(crate) frames: FramesRef,
}

/// Shared handle to a task. Equality is identity.
#[derive(Clone)]
pub struct TaskHandle(LocalScope<TaskState>);

impl TaskHandle {
    pub(crate) fn new(id: u64, kind: TaskKind, body: ExprId, env: Environment) -> Self {
        TaskHandle(LocalScope::new(TaskState {
            id,
            kind,
            body,
            env,
            status: TaskStatus::Pending,
            flags: TaskFlags::empty(),
            runner: None,
            frames: FramesRef::default(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    pub fn kind(&self) -> TaskKind {
        self.0.borrow().kind
    }

    pub fn status(&self) -> TaskStatus {
        self.0.borrow().status.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().status.is_pending()
    }

    pub fn flags(&self) -> TaskFlags {
        self.0.borrow().flags
    }

    #[inline]
    pub fn has_flag(&self, flag: TaskFlags) -> bool {
        self.0.borrow().flags.contains(flag)
    }

    pub fn cancel_requested(&self) -> bool {
        self.has_flag(TaskFlags::CANCEL_REQUESTED)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &TaskHandle) -> bool {
        self.0.ptr_eq(&other.0)
    }

    pub(crate) fn set_flag(&self, flag: TaskFlags, on: bool) {
        self.0.borrow_mut().flags.set(flag, on);
    }

    pub(crate) fn body(&self) -> (ExprId, Environment) {
        let state = self.0.borrow();
        (state.body, state.env.clone())
    }

    pub(crate) fn frames(&self) -> FramesRef {
        self.0.borrow().frames.clone()
    }

    pub(crate) fn runner(&self) -> Option<Job> {
        self.0.borrow().runner.clone()
    }

    pub(crate) fn set_runner(&self, job: Job) {
        self.0.borrow_mut().runner = Some(job);
    }

    /// Move to `status`. A terminal status releases the runner and
    /// clears saved continuation state.
    pub(crate) fn settle(&self, status: TaskStatus) {
        let frames = {
            let mut state = self.0.borrow_mut();
            let terminal = status.is_terminal();
            state.status = status;
            if !terminal {
                return;
            }
            state.runner = None;
            state.flags.remove(TaskFlags::PARKED | TaskFlags::QUEUED);
            state.frames.clone()
        };
        frames.borrow_mut().clear();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("TaskHandle")
            .field("id", &state.id)
            .field("kind", &state.kind)
            .field("status", &state.status.label())
            .field("flags", &state.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests;
