//! Binary and unary operator implementations.
//!
//! Direct enum dispatch over the fixed set of operand types. `and`/`or`
//! short-circuit and never reach this module: the interpreter evaluates
//! the right operand only when needed.

use able_ir::{BinaryOp, UnaryOp};

use crate::errors::{
    binary_type_mismatch, division_by_zero, integer_overflow, invalid_binary_op, modulo_by_zero,
};
use crate::{EvalError, Value};

/// Checked integer operation; `None` from the std method means overflow.
#[inline]
fn checked(result: Option<i64>, op_name: &'static str) -> Result<Value, EvalError> {
    result.map(Value::Int).ok_or_else(|| integer_overflow(op_name))
}

fn eval_int_binary(a: i64, op: BinaryOp, b: i64) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => checked(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                Err(division_by_zero())
            } else {
                checked(a.checked_div(b), "division")
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(modulo_by_zero())
            } else {
                checked(a.checked_rem(b), "modulo")
            }
        }
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::And | BinaryOp::Or => Err(invalid_binary_op("Int", op.as_symbol())),
    }
}

fn eval_float_binary(a: f64, op: BinaryOp, b: f64) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a % b)),
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::And | BinaryOp::Or => Err(invalid_binary_op("Float", op.as_symbol())),
    }
}

fn eval_str_binary(a: &str, op: BinaryOp, b: &str) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len().saturating_add(b.len()));
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        _ => Err(invalid_binary_op("String", op.as_symbol())),
    }
}

/// Evaluate a non-short-circuit binary operation.
pub fn evaluate_binary(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, op, *b),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(*a, op, *b),
        (Value::Str(a), Value::Str(b)) => eval_str_binary(a, op, b),
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut items = Vec::with_capacity(a.len().saturating_add(b.len()));
            items.extend(a.iter().cloned());
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        }
        _ => match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::NotEq => Ok(Value::Bool(left != right)),
            _ if left.type_name() == right.type_name() => {
                Err(invalid_binary_op(left.type_name(), op.as_symbol()))
            }
            _ => Err(binary_type_mismatch(
                left.type_name(),
                right.type_name(),
                op.as_symbol(),
            )),
        },
    }
}

pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => checked(n.checked_neg(), "negation"),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(invalid_binary_op(other.type_name(), "-")),
        (UnaryOp::Not, other) => Err(invalid_binary_op(other.type_name(), "!")),
    }
}
