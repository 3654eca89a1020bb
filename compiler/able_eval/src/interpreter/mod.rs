//! Tree-walking interpreter.
//!
//! # Architecture
//!
//! `eval(ExprId, &Environment)` dispatches on the node kind. Plain nodes
//! are handled here; the helpers live in submodules:
//!
//! - `control` - suspendable constructs (block, if, while, loop, for,
//!   match, rescue, ensure) and breakpoints
//! - `operands` - operators, literals and calls whose operands may suspend
//! - `function_call` - calls, method dispatch, field access
//! - `tasks` - proc/future lifecycle and scheduler draining
//! - `generators` - iterator literals, `next`/`close`, `gen.yield`/`gen.stop`
//!
//! # Continuations
//!
//! The interpreter keeps a stack of `ContinuationFrames`: the frames of
//! each task or generator currently being driven, innermost last.
//! Suspendable constructs consult the top of that stack; when it is empty
//! they take a plain path with no bookkeeping.

mod builder;
mod control;
mod function_call;
mod generators;
mod interned_names;
mod operands;
mod tasks;

pub use builder::InterpreterBuilder;

use able_ir::{BinaryOp, ExprId, ExprKind, Name, SharedArena, SharedInterner, Span};

use crate::async_context::AsyncContextStack;
use crate::builtins::{ChannelTable, MutexTable};
use crate::continuation::FramesRef;
use crate::errors::{
    cannot_assign_immutable, index_out_of_bounds, loop_control_outside_loop, type_mismatch,
    undefined_variable, unknown_break_label, yield_outside_task,
};
use crate::exec::pattern::bind_pattern;
use crate::generator::GeneratorHandle;
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::print_handler::SharedPrintHandler;
use crate::scheduler::Scheduler;
use crate::task::TaskHandle;
use crate::{
    AssignError, ControlAction, Environment, EvalError, EvalResult, Mutability,
    UserMethodRegistry, Value,
};
use interned_names::InternedNames;

pub struct Interpreter {
    pub(crate) arena: SharedArena,
    pub(crate) interner: SharedInterner,
    pub(crate) globals: Environment,
    pub(crate) names: InternedNames,
    pub(crate) methods: UserMethodRegistry,
    pub(crate) print_handler: SharedPrintHandler,
    pub(crate) scheduler: Scheduler,
    pub(crate) async_stack: AsyncContextStack,
    /// Frames of the tasks and generators being driven, innermost last.
    pub(crate) continuations: Vec<FramesRef>,
    /// Generators whose `next()` is on the stack, innermost last.
    pub(crate) generators: Vec<GeneratorHandle>,
    /// Labels of the enclosing breakpoints, innermost last.
    pub(crate) breakpoints: Vec<Name>,
    pub(crate) channels: ChannelTable,
    pub(crate) mutexes: MutexTable,
    pub(crate) next_task_id: u64,
}

impl Interpreter {
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Bind a global value.
    pub fn define_global(&self, name: &str, value: Value) {
        let name = self.interner.intern(name);
        self.globals.define(name, value, Mutability::Mutable);
    }

    /// Register `callable` as method `method` of `type_name`.
    pub fn register_method(&mut self, type_name: &str, method: &str, callable: Value) {
        let type_name = self.interner.intern(type_name);
        let method = self.interner.intern(method);
        self.methods.register(type_name, method, callable);
    }

    /// Evaluate `root` in the global environment as a program.
    ///
    /// A top-level `return` ends the program with its value. Anything else
    /// escaping the program is reported as an error.
    pub fn run(&mut self, root: ExprId) -> Result<Value, EvalError> {
        let globals = self.globals.clone();
        match self.eval(root, &globals) {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Error(e)) => Err(e),
            Err(ControlAction::Raise(value)) => Err(EvalError::new(format!(
                "uncaught error: {}",
                self.display(&value)
            ))),
            Err(ControlAction::Break { .. } | ControlAction::BreakLabel { .. }) => {
                Err(loop_control_outside_loop("break"))
            }
            Err(ControlAction::Continue { .. }) => Err(loop_control_outside_loop("continue")),
            Err(ControlAction::Yield | ControlAction::GeneratorYield) => Err(yield_outside_task()),
            Err(ControlAction::GeneratorStop) => Err(EvalError::new(
                "gen.stop called outside its generator body",
            )),
        }
    }

    /// Evaluate one expression.
    pub fn eval(&mut self, id: ExprId, env: &Environment) -> EvalResult {
        able_stack::ensure_sufficient_stack(|| self.eval_inner(id, env))
    }

    fn eval_inner(&mut self, id: ExprId, env: &Environment) -> EvalResult {
        let expr = *self.arena.get_expr(id);
        let span = expr.span;
        match expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(n)),
            ExprKind::Float(x) => Ok(Value::Float(x)),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Str(s) => Ok(Value::string(self.interner.lookup(s))),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Void => Ok(Value::Void),
            ExprKind::Ident(name) => env.lookup(name).ok_or_else(|| {
                undefined_variable(self.interner.lookup(name))
                    .with_span(span)
                    .into()
            }),

            ExprKind::Binary { op, left, right } => {
                self.eval_binary(id, op, left, right, env, span)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                evaluate_unary(op, &value).map_err(|e| e.with_span(span).into())
            }

            ExprKind::Declare { pattern, init } => {
                let value = self.eval(init, env)?;
                let arena = self.arena.clone();
                bind_pattern(
                    arena.get_binding_pattern(pattern),
                    value.clone(),
                    Mutability::Mutable,
                    env,
                )
                .map_err(|e| e.with_span(span))?;
                Ok(value)
            }
            ExprKind::Assign { target, op, value } => {
                self.eval_assign(target, op, value, env, span)
            }

            ExprKind::List(items) => self.eval_list(id, items, env),
            ExprKind::Range {
                start,
                end,
                inclusive,
            } => self.eval_range(id, start, end, inclusive, env, span),
            ExprKind::StructLit { name, fields } => self.eval_struct_lit(id, name, fields, env),
            ExprKind::Index { receiver, index } => {
                self.eval_index_expr(id, receiver, index, env, span)
            }
            ExprKind::Field { receiver, field } => self.eval_field_expr(id, receiver, field, env),

            ExprKind::Call { func, args } => self.eval_call(id, func, args, env),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.eval_method_call(id, receiver, method, args, env),
            ExprKind::Lambda { params, body } => {
                let params = self.arena.get_params(params).to_vec();
                Ok(Value::function(params, body, env.clone()))
            }

            ExprKind::Block(stmts) => self.eval_block(id, stmts, env),
            ExprKind::If {
                cond,
                then_branch,
                clauses,
            } => self.eval_if(id, cond, then_branch, clauses, env),
            ExprKind::While { cond, body } => self.eval_while(id, cond, body, env),
            ExprKind::Loop { body } => self.eval_loop(body, env),
            ExprKind::For {
                pattern,
                iterable,
                body,
            } => self.eval_for(id, pattern, iterable, body, env),
            ExprKind::Match { subject, arms } => self.eval_match(id, subject, arms, env),
            ExprKind::Rescue { body, arms } => self.eval_rescue(id, body, arms, env),
            ExprKind::Ensure { body, cleanup } => self.eval_ensure(id, body, cleanup, env),
            ExprKind::Breakpoint { label, body } => self.eval_breakpoint(label, body, env),

            ExprKind::Break { label, value } => {
                let value = self.eval_optional(value, env)?;
                Err(ControlAction::Break { label, value })
            }
            ExprKind::Continue { label } => Err(ControlAction::Continue { label }),
            ExprKind::Return(value) => {
                let value = self.eval_optional(value, env)?;
                Err(ControlAction::Return(value))
            }
            ExprKind::Raise(value) => {
                let value = self.eval(value, env)?;
                Err(ControlAction::Raise(value))
            }

            ExprKind::Proc(body) => Ok(Value::Proc(self.create_proc(body, env))),
            ExprKind::Spawn(body) => Ok(Value::Future(self.create_future(body, env))),
            ExprKind::IteratorLiteral { binding, body } => {
                Ok(Value::Iterator(self.create_generator(binding, body, env)))
            }
        }
    }

    fn eval_optional(&mut self, id: ExprId, env: &Environment) -> EvalResult {
        match id.to_option() {
            Some(id) => self.eval(id, env),
            None => Ok(Value::Nil),
        }
    }

    fn eval_assign(
        &mut self,
        target: Name,
        op: Option<BinaryOp>,
        value: ExprId,
        env: &Environment,
        span: Span,
    ) -> EvalResult {
        let mut value = self.eval(value, env)?;
        if let Some(op) = op {
            let current = env.lookup(target).ok_or_else(|| {
                undefined_variable(self.interner.lookup(target)).with_span(span)
            })?;
            value = evaluate_binary(&current, op, &value).map_err(|e| e.with_span(span))?;
        }
        match env.assign(target, value.clone()) {
            Ok(()) => Ok(value),
            Err(AssignError::Immutable) => {
                Err(cannot_assign_immutable(self.interner.lookup(target)).with_span(span).into())
            }
            Err(AssignError::Undefined) => {
                Err(undefined_variable(self.interner.lookup(target)).with_span(span).into())
            }
        }
    }

    fn eval_index(&self, receiver: &Value, index: i64) -> Result<Value, EvalError> {
        match receiver {
            Value::List(items) => usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| index_out_of_bounds(index)),
            Value::Str(s) => usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| index_out_of_bounds(index)),
            other => Err(type_mismatch("Array", other.type_name())),
        }
    }

    /// Frames of the innermost task or generator being driven.
    #[inline]
    pub(crate) fn active_frames(&self) -> Option<FramesRef> {
        self.continuations.last().cloned()
    }

    pub(crate) fn current_task(&self) -> Option<TaskHandle> {
        self.async_stack.current().cloned()
    }

    /// Resolve a labeled `break` against the enclosing breakpoints.
    pub(crate) fn resolve_break_label(&self, label: Name, value: Value) -> ControlAction {
        if self.breakpoints.contains(&label) {
            ControlAction::BreakLabel { label, value }
        } else {
            unknown_break_label(self.interner.lookup(label)).into()
        }
    }

    /// Stringify a value for `print` and error messages.
    pub fn display(&self, value: &Value) -> String {
        value.display(&self.interner).to_string()
    }
}
