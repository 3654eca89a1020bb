//! Suspendable control flow.
//!
//! Every construct here runs through a `FrameSlot`. Inside a task or
//! generator the slot is bound to that owner's frames: the construct takes
//! its saved state on entry, resumes from the recorded stage, and saves a
//! fresh state only when a suspension unwinds through it. Outside any
//! owner the slot is detached and the same code runs with no bookkeeping.
//!
//! On resume a block re-enters the statement that suspended. That
//! statement's own frames, and those of the expressions inside it, lead
//! evaluation back to the exact suspension point without repeating
//! finished work.

use able_ir::{ArmRange, BindingPatternId, ExprId, ExprRange, Name, OrClauseRange};

use super::Interpreter;
use crate::continuation::{
    BlockState, EnsureStage, ForSource, ForState, FrameSlot, FrameState, IfStage, MatchStage,
    MatchState, Outcome, RescueStage, WhileState,
};
use crate::errors::{labeled_continue, non_exhaustive_match, not_iterable};
use crate::exec::pattern::{bind_pattern, try_match};
use crate::signal::LoopAction;
use crate::{ControlAction, Environment, EvalResult, Mutability, Value};

impl Interpreter {
    /// Run `f` with a slot for construct `id`.
    pub(super) fn with_slot<T>(
        &mut self,
        id: ExprId,
        f: impl FnOnce(&mut Self, &FrameSlot) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let slot = match self.active_frames() {
            Some(frames) => FrameSlot::enter(frames, id),
            None => FrameSlot::detached(),
        };
        let result = f(self, &slot);
        slot.leave();
        result
    }

    /// Decide what a loop does with an action escaping its body.
    pub(crate) fn to_loop_action(&self, action: ControlAction) -> LoopAction {
        match action {
            ControlAction::Break { label: None, value } => LoopAction::Break(value),
            ControlAction::Break {
                label: Some(label),
                value,
            } => LoopAction::Exit(self.resolve_break_label(label, value)),
            ControlAction::Continue { label: None } => LoopAction::Continue,
            ControlAction::Continue { label: Some(_) } => {
                LoopAction::Exit(labeled_continue().into())
            }
            other => LoopAction::Exit(other),
        }
    }

    // Block

    pub(super) fn eval_block(
        &mut self,
        id: ExprId,
        stmts: ExprRange,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| this.run_block(slot, stmts, env))
    }

    fn run_block(&mut self, slot: &FrameSlot, stmts: ExprRange, env: &Environment) -> EvalResult {
        let (scope, start) = match slot.take() {
            Some(FrameState::Block(state)) => (state.env, state.index),
            _ => (env.child(), 0),
        };
        let arena = self.arena.clone();
        let mut result = Value::Void;
        for (index, &stmt) in arena.get_expr_list(stmts).iter().enumerate().skip(start) {
            match self.eval(stmt, &scope) {
                Ok(value) => result = value,
                Err(action) => {
                    return Err(slot.save(action, || {
                        FrameState::Block(BlockState {
                            env: scope.clone(),
                            index,
                        })
                    }));
                }
            }
        }
        Ok(result)
    }

    // If

    pub(super) fn eval_if(
        &mut self,
        id: ExprId,
        cond: ExprId,
        then_branch: ExprId,
        clauses: OrClauseRange,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| {
            this.run_if(slot, cond, then_branch, clauses, env)
        })
    }

    fn run_if(
        &mut self,
        slot: &FrameSlot,
        cond: ExprId,
        then_branch: ExprId,
        clauses: OrClauseRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let clauses = arena.get_or_clauses(clauses);
        let stage = match slot.take() {
            Some(FrameState::If(stage)) => stage,
            _ => IfStage::Condition,
        };
        let save = |stage: IfStage| move |action| slot.save(action, || FrameState::If(stage));

        let first_clause = match stage {
            IfStage::Then => return self.eval(then_branch, env).map_err(save(IfStage::Then)),
            IfStage::OrBody(i) => {
                let body = clauses.get(i).map_or(ExprId::INVALID, |c| c.body);
                return self.eval_optional(body, env).map_err(save(IfStage::OrBody(i)));
            }
            IfStage::Condition => {
                let test = self.eval(cond, env).map_err(save(IfStage::Condition))?;
                if test.is_truthy() {
                    return self.eval(then_branch, env).map_err(save(IfStage::Then));
                }
                0
            }
            IfStage::OrCondition(i) => i,
        };

        for (i, clause) in clauses.iter().enumerate().skip(first_clause) {
            if clause.cond.is_valid() {
                let test = self
                    .eval(clause.cond, env)
                    .map_err(save(IfStage::OrCondition(i)))?;
                if !test.is_truthy() {
                    continue;
                }
            }
            return self.eval(clause.body, env).map_err(save(IfStage::OrBody(i)));
        }
        Ok(Value::Nil)
    }

    // While / loop

    pub(super) fn eval_while(
        &mut self,
        id: ExprId,
        cond: ExprId,
        body: ExprId,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| this.run_while(slot, cond, body, env))
    }

    fn run_while(
        &mut self,
        slot: &FrameSlot,
        cond: ExprId,
        body: ExprId,
        env: &Environment,
    ) -> EvalResult {
        let (mut in_body, mut result) = match slot.take() {
            Some(FrameState::While(state)) => (state.in_body, state.result),
            _ => (false, Value::Nil),
        };
        loop {
            if !in_body {
                match self.eval(cond, env) {
                    Ok(test) if test.is_truthy() => {}
                    Ok(_) => return Ok(result),
                    Err(action) => {
                        return Err(slot.save(action, || {
                            FrameState::While(WhileState {
                                in_body: false,
                                result,
                            })
                        }));
                    }
                }
            }
            in_body = false;
            match self.eval(body, env) {
                Ok(value) => result = value,
                Err(action) if action.is_suspension() => {
                    return Err(slot.save(action, || {
                        FrameState::While(WhileState {
                            in_body: true,
                            result,
                        })
                    }));
                }
                Err(action) => match self.to_loop_action(action) {
                    LoopAction::Continue => {}
                    LoopAction::Break(value) => return Ok(value),
                    LoopAction::Exit(action) => return Err(action),
                },
            }
        }
    }

    /// `loop { body }`. Keeps no state of its own: a suspended body resumes
    /// through its own frames.
    pub(super) fn eval_loop(&mut self, body: ExprId, env: &Environment) -> EvalResult {
        loop {
            if let Err(action) = self.eval(body, env) {
                match self.to_loop_action(action) {
                    LoopAction::Continue => {}
                    LoopAction::Break(value) => return Ok(value),
                    LoopAction::Exit(action) => return Err(action),
                }
            }
        }
    }

    // For

    pub(super) fn eval_for(
        &mut self,
        id: ExprId,
        pattern: BindingPatternId,
        iterable: ExprId,
        body: ExprId,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| {
            this.run_for(slot, pattern, iterable, body, env)
        })
    }

    fn run_for(
        &mut self,
        slot: &FrameSlot,
        pattern: BindingPatternId,
        iterable: ExprId,
        body: ExprId,
        env: &Environment,
    ) -> EvalResult {
        let (mut source, mut pending_env, mut result) = match slot.take() {
            Some(FrameState::For(state)) => (state.source, state.iteration_env, state.result),
            _ => {
                let iterable = self.eval(iterable, env)?;
                (self.for_source(iterable)?, None, Value::Nil)
            }
        };
        let arena = self.arena.clone();
        let pattern = arena.get_binding_pattern(pattern);

        loop {
            let iteration_env = match pending_env.take() {
                Some(scope) => scope,
                None => {
                    let item = match self.next_item(&mut source) {
                        Ok(Some(item)) => item,
                        Ok(None) => {
                            self.close_source(&source)?;
                            return Ok(result);
                        }
                        Err(action) if action.is_suspension() => {
                            return Err(slot.save(action, || {
                                FrameState::For(ForState {
                                    source,
                                    iteration_env: None,
                                    result,
                                })
                            }));
                        }
                        Err(action) => {
                            self.close_source_after_failure(&source);
                            return Err(action);
                        }
                    };
                    let scope = env.child();
                    if let Err(e) = bind_pattern(pattern, item, Mutability::Immutable, &scope) {
                        self.close_source_after_failure(&source);
                        return Err(e.into());
                    }
                    scope
                }
            };

            match self.eval(body, &iteration_env) {
                Ok(value) => result = value,
                Err(action) if action.is_suspension() => {
                    return Err(slot.save(action, || {
                        FrameState::For(ForState {
                            source,
                            iteration_env: Some(iteration_env),
                            result,
                        })
                    }));
                }
                Err(action) => match self.to_loop_action(action) {
                    LoopAction::Continue => {}
                    LoopAction::Break(value) => {
                        self.close_source(&source)?;
                        return Ok(value);
                    }
                    LoopAction::Exit(action) => {
                        self.close_source_after_failure(&source);
                        return Err(action);
                    }
                },
            }
        }
    }

    /// Resolve what a `for` loop iterates over.
    fn for_source(&mut self, iterable: Value) -> EvalResult<ForSource> {
        match iterable {
            Value::List(items) => Ok(ForSource::Static {
                values: items.to_vec(),
                index: 0,
            }),
            Value::Range(range) => Ok(ForSource::Static {
                values: range.values(),
                index: 0,
            }),
            Value::Iterator(generator) => Ok(ForSource::Generator(generator)),
            other => {
                let iterator_method = self.names.members.iterator;
                let next_method = self.names.members.next;
                if self.find_method(&other, iterator_method).is_some() {
                    let produced = self.call_method(other, iterator_method, Vec::new())?;
                    return match produced {
                        Value::Iterator(generator) => Ok(ForSource::Generator(generator)),
                        object if self.find_method(&object, next_method).is_some() => {
                            Ok(ForSource::Object(object))
                        }
                        object => Err(not_iterable(object.type_name()).into()),
                    };
                }
                if self.find_method(&other, next_method).is_some() {
                    return Ok(ForSource::Object(other));
                }
                Err(not_iterable(other.type_name()).into())
            }
        }
    }

    fn next_item(&mut self, source: &mut ForSource) -> EvalResult<Option<Value>> {
        let produced = match source {
            ForSource::Static { values, index } => {
                let item = values.get(*index).cloned();
                if item.is_some() {
                    *index += 1;
                }
                return Ok(item);
            }
            ForSource::Generator(generator) => {
                let generator = generator.clone();
                self.generator_next(&generator)?
            }
            ForSource::Object(object) => {
                let next_method = self.names.members.next;
                self.call_method(object.clone(), next_method, Vec::new())?
            }
        };
        Ok(match produced {
            Value::IteratorEnd => None,
            value => Some(value),
        })
    }

    /// Close a pull-based source once the loop is finished with it.
    fn close_source(&mut self, source: &ForSource) -> EvalResult<()> {
        match source {
            ForSource::Static { .. } => Ok(()),
            ForSource::Generator(generator) => {
                generator.close();
                Ok(())
            }
            ForSource::Object(object) => {
                let close_method = self.names.members.close;
                if self.find_method(object, close_method).is_some() {
                    self.call_method(object.clone(), close_method, Vec::new())?;
                }
                Ok(())
            }
        }
    }

    /// Close after the loop already failed: the original failure wins.
    fn close_source_after_failure(&mut self, source: &ForSource) {
        if let Err(action) = self.close_source(source) {
            tracing::debug!(
                action = action.describe(),
                "iterator close failed after loop exit"
            );
        }
    }

    // Match

    pub(super) fn eval_match(
        &mut self,
        id: ExprId,
        subject: ExprId,
        arms: ArmRange,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| this.run_match(slot, subject, arms, env))
    }

    fn run_match(
        &mut self,
        slot: &FrameSlot,
        subject: ExprId,
        arms: ArmRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let arms = arena.get_arms(arms);
        let (subject, resume) = match slot.take() {
            Some(FrameState::Match(state)) => (state.subject, Some(state.stage)),
            _ => (self.eval(subject, env)?, None),
        };

        let first_arm = match resume {
            Some(MatchStage::Body { arm, env: arm_env }) => {
                let body = arms.get(arm).map_or(ExprId::INVALID, |a| a.body);
                return self.eval_optional(body, &arm_env).map_err(|action| {
                    save_match(slot, action, &subject, MatchStage::Body { arm, env: arm_env })
                });
            }
            Some(MatchStage::Guard { arm, env: arm_env }) => {
                let Some(current) = arms.get(arm) else {
                    return Err(non_exhaustive_match().into());
                };
                let passed = match self.eval(current.guard, &arm_env) {
                    Ok(passed) => passed,
                    Err(action) => {
                        let stage = MatchStage::Guard { arm, env: arm_env };
                        return Err(save_match(slot, action, &subject, stage));
                    }
                };
                if passed.is_truthy() {
                    return self.eval(current.body, &arm_env).map_err(|action| {
                        save_match(slot, action, &subject, MatchStage::Body { arm, env: arm_env })
                    });
                }
                arm + 1
            }
            None => 0,
        };

        for (arm, current) in arms.iter().enumerate().skip(first_arm) {
            let pattern = arena.get_match_pattern(current.pattern);
            let Some(bindings) = try_match(pattern, &subject, &arena, &self.interner)? else {
                continue;
            };
            let arm_env = env.child();
            for (name, value) in bindings {
                arm_env.define(name, value, Mutability::Immutable);
            }
            if current.guard.is_valid() {
                let passed = match self.eval(current.guard, &arm_env) {
                    Ok(passed) => passed,
                    Err(action) => {
                        let stage = MatchStage::Guard { arm, env: arm_env };
                        return Err(save_match(slot, action, &subject, stage));
                    }
                };
                if !passed.is_truthy() {
                    continue;
                }
            }
            return self.eval(current.body, &arm_env).map_err(|action| {
                save_match(slot, action, &subject, MatchStage::Body { arm, env: arm_env })
            });
        }
        Err(non_exhaustive_match().into())
    }

    // Rescue / ensure

    pub(super) fn eval_rescue(
        &mut self,
        id: ExprId,
        body: ExprId,
        arms: ArmRange,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| this.run_rescue(slot, body, arms, env))
    }

    fn run_rescue(
        &mut self,
        slot: &FrameSlot,
        body: ExprId,
        arms: ArmRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let arms = arena.get_arms(arms);
        let raised = match slot.take() {
            Some(FrameState::Rescue(RescueStage::Handler {
                arm,
                env: handler_env,
                raised,
            })) => {
                let handler = arms.get(arm).map_or(ExprId::INVALID, |a| a.body);
                return self.eval_optional(handler, &handler_env).map_err(|action| {
                    slot.save(action, || {
                        FrameState::Rescue(RescueStage::Handler {
                            arm,
                            env: handler_env.clone(),
                            raised: raised.clone(),
                        })
                    })
                });
            }
            Some(FrameState::Rescue(RescueStage::Matching { raised })) => raised,
            _ => match self.eval(body, env) {
                Ok(value) => return Ok(value),
                Err(ControlAction::Raise(raised)) => raised,
                Err(action) => {
                    return Err(slot.save(action, || FrameState::Rescue(RescueStage::Body)));
                }
            },
        };

        for (i, arm) in arms.iter().enumerate() {
            let pattern = arena.get_match_pattern(arm.pattern);
            let Some(bindings) = try_match(pattern, &raised, &arena, &self.interner)? else {
                continue;
            };
            let handler_env = env.child();
            for (name, value) in bindings {
                handler_env.define(name, value, Mutability::Immutable);
            }
            if arm.guard.is_valid() {
                let passed = self.eval(arm.guard, &handler_env).map_err(|action| {
                    slot.save(action, || {
                        FrameState::Rescue(RescueStage::Matching {
                            raised: raised.clone(),
                        })
                    })
                })?;
                if !passed.is_truthy() {
                    continue;
                }
            }
            return self.eval(arm.body, &handler_env).map_err(|action| {
                slot.save(action, || {
                    FrameState::Rescue(RescueStage::Handler {
                        arm: i,
                        env: handler_env.clone(),
                        raised: raised.clone(),
                    })
                })
            });
        }
        Err(ControlAction::Raise(raised))
    }

    pub(super) fn eval_ensure(
        &mut self,
        id: ExprId,
        body: ExprId,
        cleanup: ExprId,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| this.run_ensure(slot, body, cleanup, env))
    }

    /// Run `cleanup` on every exit of `body` except suspension.
    fn run_ensure(
        &mut self,
        slot: &FrameSlot,
        body: ExprId,
        cleanup: ExprId,
        env: &Environment,
    ) -> EvalResult {
        let outcome = match slot.take() {
            Some(FrameState::Ensure(EnsureStage::Cleanup { outcome })) => outcome,
            _ => match self.eval(body, env) {
                Err(action) if action.is_suspension() => {
                    return Err(slot.save(action, || FrameState::Ensure(EnsureStage::Body)));
                }
                result => Outcome::from_result(result),
            },
        };
        match self.eval(cleanup, env) {
            Ok(_) => outcome.into_result(),
            Err(action) if action.is_suspension() => {
                Err(slot.save(action, || FrameState::Ensure(EnsureStage::Cleanup { outcome })))
            }
            Err(action) => Err(action),
        }
    }

    // Breakpoints

    pub(super) fn eval_breakpoint(
        &mut self,
        label: Name,
        body: ExprId,
        env: &Environment,
    ) -> EvalResult {
        self.breakpoints.push(label);
        let result = self.eval(body, env);
        self.breakpoints.pop();
        match result {
            Err(
                ControlAction::BreakLabel { label: target, value }
                | ControlAction::Break {
                    label: Some(target),
                    value,
                },
            ) if target == label => Ok(value),
            other => other,
        }
    }
}

fn save_match(
    slot: &FrameSlot,
    action: ControlAction,
    subject: &Value,
    stage: MatchStage,
) -> ControlAction {
    slot.save(action, || {
        FrameState::Match(MatchState {
            stage,
            subject: subject.clone(),
        })
    })
}
