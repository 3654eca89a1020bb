//! Iterator literals and the generator protocol.
//!
//! `next()` resumes the body from its cursor with the generator's own
//! frames on top of the continuation stack. `gen.yield(v)` parks `v` in
//! the generator's slot and unwinds with `GeneratorYield`; `next()`
//! catches that and hands `v` out. The following `next()` resumes the
//! body at the suspended `gen.yield` call, which then returns instead of
//! yielding again.

use able_ir::{ExprRange, Name};

use super::Interpreter;
use crate::errors::{
    generator_control_outside_body, generator_reentered, yield_from_closed_iterator,
};
use crate::generator::{GeneratorFlags, GeneratorHandle, WeakGenerator};
use crate::{ControlAction, Environment, EvalResult, Mutability, Value};

impl Interpreter {
    /// `Iterator { binding => body }`
    pub(super) fn create_generator(
        &mut self,
        binding: Name,
        body: ExprRange,
        env: &Environment,
    ) -> GeneratorHandle {
        let generator_env = env.child();
        let generator = GeneratorHandle::new(generator_env.clone(), body);
        generator_env.define(
            binding,
            Value::GeneratorController(generator.downgrade()),
            Mutability::Immutable,
        );
        generator
    }

    /// `iterator.next()`
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn generator_next(&mut self, generator: &GeneratorHandle) -> EvalResult {
        let flags = generator.flags();
        if flags.intersects(GeneratorFlags::DONE | GeneratorFlags::CLOSED) {
            let stored = generator.state().borrow().stored_error.clone();
            return match stored {
                Some(action) => Err(action),
                None => Ok(Value::IteratorEnd),
            };
        }
        if flags.contains(GeneratorFlags::BUSY) {
            return Err(generator_reentered().into());
        }

        generator.set_flag(GeneratorFlags::STARTED | GeneratorFlags::BUSY, true);
        let frames = generator.frames();
        frames.borrow_mut().reset_depth();
        self.continuations.push(frames);
        self.generators.push(generator.clone());

        let breakpoints = std::mem::take(&mut self.breakpoints);
        let result = self.resume_generator(generator);
        self.breakpoints = breakpoints;

        self.generators.pop();
        self.continuations.pop();
        generator.set_flag(GeneratorFlags::BUSY, false);
        result
    }

    fn resume_generator(&mut self, generator: &GeneratorHandle) -> EvalResult {
        let (env, body, mut cursor) = {
            let state = generator.state().borrow();
            (state.env.clone(), state.body, state.cursor)
        };
        let arena = self.arena.clone();
        let stmts = arena.get_expr_list(body);

        while let Some(&stmt) = stmts.get(cursor) {
            match self.eval(stmt, &env) {
                Ok(_) => {
                    cursor += 1;
                    generator.state().borrow_mut().cursor = cursor;
                }
                Err(ControlAction::GeneratorYield) => {
                    let pending = generator.state().borrow_mut().pending.take();
                    return Ok(pending.unwrap_or(Value::Nil));
                }
                Err(ControlAction::Yield) => return Err(ControlAction::Yield),
                Err(ControlAction::GeneratorStop | ControlAction::Return(_)) => {
                    self.finish_generator(generator, None);
                    return Ok(Value::IteratorEnd);
                }
                Err(other) => {
                    tracing::debug!(action = other.describe(), "generator body failed");
                    self.finish_generator(generator, Some(other.clone()));
                    return Err(other);
                }
            }
        }
        self.finish_generator(generator, None);
        Ok(Value::IteratorEnd)
    }

    fn finish_generator(&self, generator: &GeneratorHandle, error: Option<ControlAction>) {
        let frames = {
            let mut state = generator.state().borrow_mut();
            state.flags.insert(GeneratorFlags::DONE);
            state.pending = None;
            state.stored_error = error;
            state.frames.clone()
        };
        frames.borrow_mut().clear();
    }

    /// The controller's generator, provided its body is the one running.
    fn controlled_generator(
        &self,
        controller: &WeakGenerator,
        method: &'static str,
    ) -> EvalResult<GeneratorHandle> {
        match (controller.upgrade(), self.generators.last()) {
            (Some(generator), Some(top)) if generator.ptr_eq(top) => Ok(generator),
            _ => Err(generator_control_outside_body(method).into()),
        }
    }

    /// `gen.yield(value)`
    pub(crate) fn generator_yield(
        &mut self,
        controller: &WeakGenerator,
        value: Value,
    ) -> EvalResult {
        let generator = self.controlled_generator(controller, "yield")?;
        if generator.flags().contains(GeneratorFlags::CLOSED) {
            return Err(yield_from_closed_iterator().into());
        }
        if generator.frames().borrow().is_resuming_call() {
            return Ok(Value::Nil);
        }
        generator.state().borrow_mut().pending = Some(value);
        Err(ControlAction::GeneratorYield)
    }

    /// `gen.stop()`
    pub(crate) fn generator_stop(&mut self, controller: &WeakGenerator) -> EvalResult {
        self.controlled_generator(controller, "stop")?;
        Err(ControlAction::GeneratorStop)
    }
}
