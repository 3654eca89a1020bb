//! FIFO cooperative scheduler.
//!
//! Holds runner jobs in enqueue order. Draining is done by the interpreter
//! (jobs need `&mut Interpreter`); this type only tracks the queue and the
//! reentrancy flag that forbids nested drains.

use std::collections::VecDeque;

use crate::task::Job;

/// Default step budget for `proc_flush` and forced handle access.
pub const DEFAULT_MAX_STEPS: usize = 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Most jobs one drain will run.
    pub max_steps: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

pub struct Scheduler {
    queue: VecDeque<Job>,
    draining: bool,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Scheduler {
            queue: VecDeque::new(),
            draining: false,
            config,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub(crate) fn enqueue(&mut self, job: Job) {
        self.queue.push_back(job);
        tracing::trace!(pending = self.queue.len(), "job enqueued");
    }

    pub(crate) fn pop(&mut self) -> Option<Job> {
        self.queue.pop_front()
    }

    /// Jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Claim the drain. `false` if a drain is already running.
    pub(crate) fn begin_drain(&mut self) -> bool {
        !std::mem::replace(&mut self.draining, true)
    }

    pub(crate) fn end_drain(&mut self) {
        self.draining = false;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(SchedulerConfig::default())
    }
}
