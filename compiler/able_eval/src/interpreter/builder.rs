//! `InterpreterBuilder` for creating configured `Interpreter`s.

use able_ir::{ExprArena, SharedArena, SharedInterner};

use super::interned_names::InternedNames;
use super::Interpreter;
use crate::async_context::AsyncContextStack;
use crate::builtins::{register_builtins, ChannelTable, MutexTable};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::{stdout_handler, Environment, SharedPrintHandler, UserMethodRegistry};

/// Builder for an interpreter over one program arena.
pub struct InterpreterBuilder {
    interner: SharedInterner,
    arena: SharedArena,
    scheduler: SchedulerConfig,
    print_handler: Option<SharedPrintHandler>,
    methods: Option<UserMethodRegistry>,
}

impl InterpreterBuilder {
    pub fn new(interner: SharedInterner, arena: ExprArena) -> Self {
        Self::with_shared_arena(interner, SharedArena::new(arena))
    }

    pub fn with_shared_arena(interner: SharedInterner, arena: SharedArena) -> Self {
        Self {
            interner,
            arena,
            scheduler: SchedulerConfig::default(),
            print_handler: None,
            methods: None,
        }
    }

    /// Step budget for `proc_flush` and for draining on forced handle access.
    #[must_use]
    pub fn scheduler_max_steps(mut self, max_steps: usize) -> Self {
        self.scheduler.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = config;
        self
    }

    /// Destination of `print`. Defaults to stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn method_registry(mut self, registry: UserMethodRegistry) -> Self {
        self.methods = Some(registry);
        self
    }

    pub fn build(self) -> Interpreter {
        let names = InternedNames::new(&self.interner);
        let globals = Environment::new();
        register_builtins(&globals, &self.interner);
        tracing::debug!(
            max_steps = self.scheduler.max_steps,
            exprs = self.arena.expr_count(),
            "interpreter built"
        );
        Interpreter {
            arena: self.arena,
            interner: self.interner,
            globals,
            names,
            methods: self.methods.unwrap_or_default(),
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            scheduler: Scheduler::new(self.scheduler),
            async_stack: AsyncContextStack::default(),
            continuations: Vec::new(),
            generators: Vec::new(),
            breakpoints: Vec::new(),
            channels: ChannelTable::default(),
            mutexes: MutexTable::default(),
            next_task_id: 1,
        }
    }
}
