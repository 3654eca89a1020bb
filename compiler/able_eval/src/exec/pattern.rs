//! Binding patterns (`:=`, `for` heads) and match patterns (`match`,
//! `rescue` arms).

use able_ir::{BindingPattern, ExprArena, ExprKind, MatchPattern, Name, StringInterner};

use crate::errors::{pattern_mismatch, type_mismatch};
use crate::{Environment, EvalError, Mutability, Value};

/// Bind `value` to `pattern` in `env`.
pub fn bind_pattern(
    pattern: &BindingPattern,
    value: Value,
    mutability: Mutability,
    env: &Environment,
) -> Result<(), EvalError> {
    match pattern {
        BindingPattern::Name(name) => {
            env.define(*name, value, mutability);
            Ok(())
        }
        BindingPattern::Wildcard => Ok(()),
        BindingPattern::List { elements, rest } => {
            let Value::List(values) = value else {
                return Err(type_mismatch("Array", value.type_name()));
            };
            if values.len() < elements.len() || (rest.is_none() && values.len() > elements.len()) {
                return Err(pattern_mismatch(format!(
                    "list pattern expects {} element(s), got {}",
                    elements.len(),
                    values.len()
                )));
            }
            for (pat, val) in elements.iter().zip(values.iter()) {
                bind_pattern(pat, val.clone(), mutability, env)?;
            }
            if let Some(rest_name) = rest {
                let tail = values.get(elements.len()..).unwrap_or_default().to_vec();
                env.define(*rest_name, Value::list(tail), mutability);
            }
            Ok(())
        }
    }
}

/// Match `value` against `pattern`, returning the bindings on success.
pub fn try_match(
    pattern: &MatchPattern,
    value: &Value,
    arena: &ExprArena,
    interner: &StringInterner,
) -> Result<Option<Vec<(Name, Value)>>, EvalError> {
    let mut bindings = Vec::new();
    if match_into(pattern, value, arena, interner, &mut bindings)? {
        Ok(Some(bindings))
    } else {
        Ok(None)
    }
}

fn match_into(
    pattern: &MatchPattern,
    value: &Value,
    arena: &ExprArena,
    interner: &StringInterner,
    bindings: &mut Vec<(Name, Value)>,
) -> Result<bool, EvalError> {
    match pattern {
        MatchPattern::Wildcard => Ok(true),
        MatchPattern::Binding(name) => {
            // A capitalized name against a variant is a unit-variant test.
            if let Value::Variant {
                variant_name,
                fields,
                ..
            } = value
            {
                if name == variant_name {
                    return Ok(fields.is_empty());
                }
                if interner
                    .lookup(*name)
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
                {
                    return Ok(false);
                }
            }
            bindings.push((*name, value.clone()));
            Ok(true)
        }
        MatchPattern::Literal(expr_id) => {
            let literal = literal_value(arena.get_expr(*expr_id).kind, interner)?;
            Ok(literal == *value)
        }
        MatchPattern::Variant { name, fields } => {
            let Value::Variant {
                variant_name,
                fields: values,
                ..
            } = value
            else {
                return Ok(false);
            };
            if variant_name != name || values.len() != fields.len() {
                return Ok(false);
            }
            for (sub, val) in fields.iter().zip(values.iter()) {
                if !match_into(sub, val, arena, interner, bindings)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        MatchPattern::Struct { name, fields } => {
            let Value::Struct(s) = value else {
                return Ok(false);
            };
            if s.type_name != *name {
                return Ok(false);
            }
            for (field, sub) in fields {
                let Some(val) = s.get(*field) else {
                    return Ok(false);
                };
                if !match_into(sub, val, arena, interner, bindings)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn literal_value(kind: ExprKind, interner: &StringInterner) -> Result<Value, EvalError> {
    match kind {
        ExprKind::Int(n) => Ok(Value::Int(n)),
        ExprKind::Float(x) => Ok(Value::Float(x)),
        ExprKind::Bool(b) => Ok(Value::Bool(b)),
        ExprKind::Str(s) => Ok(Value::string(interner.lookup(s))),
        ExprKind::Nil => Ok(Value::Nil),
        ExprKind::Void => Ok(Value::Void),
        _ => Err(pattern_mismatch("literal pattern must be a literal")),
    }
}
