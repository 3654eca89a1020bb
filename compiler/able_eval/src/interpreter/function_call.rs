//! Calls, method dispatch, and field access.

use able_ir::Name;

use super::Interpreter;
use crate::errors::{
    loop_control_outside_loop, no_field, no_such_method, not_callable, wrong_arg_count,
};
use crate::{ControlAction, EvalError, EvalResult, Mutability, Value};

impl Interpreter {
    /// Call a function or builtin value.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Function(f) => {
                if args.len() != f.params.len() {
                    return Err(wrong_arg_count("<lambda>", f.params.len(), args.len()).into());
                }
                let call_env = f.env.child();
                for (&param, arg) in f.params.iter().zip(args) {
                    call_env.define(param, arg, Mutability::Immutable);
                }
                match self.eval(f.body, &call_env) {
                    Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
                    Err(ControlAction::Break { label: None, .. }) => {
                        Err(loop_control_outside_loop("break").into())
                    }
                    Err(ControlAction::Continue { .. }) => {
                        Err(loop_control_outside_loop("continue").into())
                    }
                    Err(ControlAction::Break {
                        label: Some(label),
                        value,
                    }) => Err(self.resolve_break_label(label, value)),
                    Err(other) => Err(other),
                }
            }
            Value::Builtin(builtin) => {
                if args.len() != builtin.arity {
                    return Err(wrong_arg_count(builtin.name, builtin.arity, args.len()).into());
                }
                (builtin.func)(self, &args)
            }
            other => Err(not_callable(other.type_name()).into()),
        }
    }

    /// Registered method `method` of a struct or variant receiver.
    pub(crate) fn find_method(&self, receiver: &Value, method: Name) -> Option<Value> {
        let type_name = match receiver {
            Value::Struct(s) => s.type_name,
            Value::Variant { type_name, .. } => *type_name,
            _ => return None,
        };
        self.methods.lookup(type_name, method).cloned()
    }

    /// `receiver.method(args)`
    pub(crate) fn call_method(
        &mut self,
        receiver: Value,
        method: Name,
        mut args: Vec<Value>,
    ) -> EvalResult {
        let members = self.names.members;
        match &receiver {
            Value::Proc(task) if method == members.cancel => {
                self.expect_no_args(method, &args)?;
                self.cancel_task(task);
                Ok(Value::Void)
            }
            Value::Proc(task) | Value::Future(task) if method == members.value => {
                self.expect_no_args(method, &args)?;
                self.task_value(task)
            }
            Value::Proc(task) | Value::Future(task) if method == members.status => {
                self.expect_no_args(method, &args)?;
                Ok(self.task_status_value(task))
            }
            Value::Iterator(generator) if method == members.next => {
                self.expect_no_args(method, &args)?;
                self.generator_next(generator)
            }
            Value::Iterator(generator) if method == members.close => {
                self.expect_no_args(method, &args)?;
                generator.close();
                Ok(Value::Void)
            }
            Value::GeneratorController(controller) if method == members.yield_ => {
                if args.len() != 1 {
                    return Err(wrong_arg_count("gen.yield", 1, args.len()).into());
                }
                let value = args.pop().unwrap_or(Value::Nil);
                self.generator_yield(controller, value)
            }
            Value::GeneratorController(controller) if method == members.stop => {
                self.expect_no_args(method, &args)?;
                self.generator_stop(controller)
            }
            Value::List(items) if method == members.len => {
                self.expect_no_args(method, &args)?;
                Ok(Value::Int(length(items.len())))
            }
            Value::Str(s) if method == members.len => {
                self.expect_no_args(method, &args)?;
                Ok(Value::Int(length(s.chars().count())))
            }
            Value::Struct(_) | Value::Variant { .. } => {
                let Some(callable) = self.find_method(&receiver, method) else {
                    return Err(self.no_such_method(method, &receiver).into());
                };
                args.insert(0, receiver);
                self.call_value(&callable, args)
            }
            _ => Err(self.no_such_method(method, &receiver).into()),
        }
    }

    /// `receiver.field`
    pub(crate) fn eval_field(&mut self, receiver: Value, field: Name) -> EvalResult {
        let members = self.names.members;
        match &receiver {
            Value::Struct(s) => s.get(field).cloned().ok_or_else(|| {
                no_field(
                    self.interner.lookup(field),
                    self.interner.lookup(s.type_name),
                )
                .into()
            }),
            Value::Proc(task) | Value::Future(task) if field == members.value => {
                self.task_value(task)
            }
            Value::Proc(task) | Value::Future(task) if field == members.status => {
                Ok(self.task_status_value(task))
            }
            Value::Error(e) if field == members.message => Ok(Value::string(e.message.clone())),
            Value::Error(e) if field == members.value => {
                Ok(e.payload.clone().unwrap_or(Value::Nil))
            }
            other => Err(no_field(self.interner.lookup(field), other.type_name()).into()),
        }
    }

    fn expect_no_args(&self, method: Name, args: &[Value]) -> Result<(), EvalError> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(wrong_arg_count(self.interner.lookup(method), 0, args.len()))
        }
    }

    fn no_such_method(&self, method: Name, receiver: &Value) -> EvalError {
        let type_name = match receiver {
            Value::Struct(s) => self.interner.lookup(s.type_name),
            Value::Variant { type_name, .. } => self.interner.lookup(*type_name),
            other => other.type_name(),
        };
        no_such_method(self.interner.lookup(method), type_name)
    }
}

fn length(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
