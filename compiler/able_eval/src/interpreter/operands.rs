//! Compound expressions: operators, literals, field access, and calls.
//!
//! Operands are evaluated left to right. When one suspends, the values of
//! the operands before it are saved in the expression's frame and the
//! resumed expression continues at the suspended operand. When the
//! operation itself suspends (a call that yields, `.value` on a pending
//! handle), every operand value is saved and the operation is applied
//! again on resume.
//!
//! Single-operand nodes (`:=`, assignment, unary operators, `return`,
//! `raise`) need no frame: nothing finished before their operand, and
//! the operand resumes through its own frames.

use able_ir::{BinaryOp, ExprId, ExprRange, FieldInitRange, Name, Span};

use super::Interpreter;
use crate::continuation::{FrameSlot, FrameState};
use crate::errors::type_mismatch;
use crate::operators::evaluate_binary;
use crate::value::RangeValue;
use crate::{Environment, EvalResult, Value};

impl Interpreter {
    /// Evaluate `operands`, then `apply` their values.
    fn eval_compound(
        &mut self,
        id: ExprId,
        operands: &[ExprId],
        env: &Environment,
        apply: impl FnOnce(&mut Self, &[Value]) -> EvalResult,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| {
            let (values, resuming) = match slot.take() {
                Some(FrameState::Applying(values)) => (values, true),
                Some(FrameState::Operands(done)) => {
                    (this.eval_operands(slot, done, operands, env)?, false)
                }
                _ => (this.eval_operands(slot, Vec::new(), operands, env)?, false),
            };
            slot.invoke(resuming, || apply(this, &values))
                .map_err(|action| slot.save(action, || FrameState::Applying(values)))
        })
    }

    /// Evaluate the operands after the `values` already computed.
    fn eval_operands(
        &mut self,
        slot: &FrameSlot,
        mut values: Vec<Value>,
        operands: &[ExprId],
        env: &Environment,
    ) -> EvalResult<Vec<Value>> {
        for &operand in operands.get(values.len()..).unwrap_or_default() {
            match self.eval(operand, env) {
                Ok(value) => values.push(value),
                Err(action) => return Err(slot.save(action, || FrameState::Operands(values))),
            }
        }
        Ok(values)
    }

    pub(super) fn eval_binary(
        &mut self,
        id: ExprId,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        env: &Environment,
        span: Span,
    ) -> EvalResult {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.eval_short_circuit(id, op, lhs, rhs, env);
        }
        self.eval_compound(id, &[lhs, rhs], env, |_, values| {
            evaluate_binary(&values[0], op, &values[1]).map_err(|e| e.with_span(span).into())
        })
    }

    /// `&&` and `||`: the right operand runs only when the left one does
    /// not decide the result.
    fn eval_short_circuit(
        &mut self,
        id: ExprId,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        env: &Environment,
    ) -> EvalResult {
        self.with_slot(id, |this, slot| {
            let saved = match slot.take() {
                Some(FrameState::Operands(values)) => values.into_iter().next(),
                _ => None,
            };
            let left = match saved {
                Some(left) => left,
                None => this.eval(lhs, env)?,
            };
            if left.is_truthy() == matches!(op, BinaryOp::Or) {
                return Ok(Value::Bool(left.is_truthy()));
            }
            let right = this
                .eval(rhs, env)
                .map_err(|action| slot.save(action, || FrameState::Operands(vec![left])))?;
            Ok(Value::Bool(right.is_truthy()))
        })
    }

    pub(super) fn eval_list(
        &mut self,
        id: ExprId,
        items: ExprRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        self.eval_compound(id, arena.get_expr_list(items), env, |_, values| {
            Ok(Value::list(values.to_vec()))
        })
    }

    pub(super) fn eval_range(
        &mut self,
        id: ExprId,
        start: ExprId,
        end: ExprId,
        inclusive: bool,
        env: &Environment,
        span: Span,
    ) -> EvalResult {
        self.eval_compound(id, &[start, end], env, |_, values| {
            Ok(Value::Range(RangeValue {
                start: int_operand(&values[0], span)?,
                end: int_operand(&values[1], span)?,
                inclusive,
            }))
        })
    }

    pub(super) fn eval_struct_lit(
        &mut self,
        id: ExprId,
        name: Name,
        fields: FieldInitRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let inits = arena.get_field_inits(fields);
        let operands: Vec<ExprId> = inits.iter().map(|init| init.value).collect();
        self.eval_compound(id, &operands, env, |_, values| {
            let fields = inits
                .iter()
                .map(|init| init.name)
                .zip(values.iter().cloned())
                .collect();
            Ok(Value::struct_value(name, fields))
        })
    }

    pub(super) fn eval_index_expr(
        &mut self,
        id: ExprId,
        receiver: ExprId,
        index: ExprId,
        env: &Environment,
        span: Span,
    ) -> EvalResult {
        self.eval_compound(id, &[receiver, index], env, |this, values| {
            let index = int_operand(&values[1], span)?;
            this.eval_index(&values[0], index)
                .map_err(|e| e.with_span(span).into())
        })
    }

    pub(super) fn eval_field_expr(
        &mut self,
        id: ExprId,
        receiver: ExprId,
        field: Name,
        env: &Environment,
    ) -> EvalResult {
        self.eval_compound(id, &[receiver], env, |this, values| {
            this.eval_field(values[0].clone(), field)
        })
    }

    /// `func(args)`. A call that suspended is invoked again with the same
    /// callee and arguments.
    pub(super) fn eval_call(
        &mut self,
        id: ExprId,
        func: ExprId,
        args: ExprRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let operands: Vec<ExprId> = std::iter::once(func)
            .chain(arena.get_expr_list(args).iter().copied())
            .collect();
        self.eval_compound(id, &operands, env, |this, values| {
            this.call_value(&values[0], values[1..].to_vec())
        })
    }

    /// `receiver.method(args)`
    pub(super) fn eval_method_call(
        &mut self,
        id: ExprId,
        receiver: ExprId,
        method: Name,
        args: ExprRange,
        env: &Environment,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let operands: Vec<ExprId> = std::iter::once(receiver)
            .chain(arena.get_expr_list(args).iter().copied())
            .collect();
        self.eval_compound(id, &operands, env, |this, values| {
            this.call_method(values[0].clone(), method, values[1..].to_vec())
        })
    }
}

fn int_operand(value: &Value, span: Span) -> EvalResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(type_mismatch("Int", other.type_name()).with_span(span).into()),
    }
}
