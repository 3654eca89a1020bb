//! Runtime values.
//!
//! # Heap Enforcement
//!
//! Shared immutable payloads (strings, lists, structs) go through
//! `Heap<T>`, whose constructor is crate-private: values are built with the
//! factory methods on `Value`.
//!
//! Task handles, generators, and closures carry interior-mutable state and
//! compare by identity.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use able_ir::{ExprId, Name, StringInterner};

use crate::generator::{GeneratorHandle, WeakGenerator};
use crate::task::TaskHandle;
use crate::{Environment, EvalResult, Interpreter};

/// Shared, immutable heap payload.
pub struct Heap<T: ?Sized>(Rc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Rc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Native function signature.
pub type BuiltinFn = fn(&mut Interpreter, &[Value]) -> EvalResult;

/// Native function bound in the global environment.
#[derive(Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
}

/// User closure.
pub struct FunctionValue {
    pub params: Vec<Name>,
    pub body: ExprId,
    pub env: Environment,
}

/// Struct instance. Field order follows the literal.
#[derive(Debug, PartialEq)]
pub struct StructValue {
    pub type_name: Name,
    pub fields: Vec<(Name, Value)>,
}

impl StructValue {
    pub fn get(&self, field: Name) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(name, value)| (*name == field).then_some(value))
    }
}

/// Runtime error value: what `.value` returns for a failed or cancelled
/// task, and what `rescue` arms see for host failures.
#[derive(Debug, PartialEq)]
pub struct ErrorValue {
    pub message: String,
    pub payload: Option<Value>,
}

/// Integer range. `end` is exclusive unless `inclusive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub inclusive: bool,
}

impl RangeValue {
    /// Snapshot of every integer in the range.
    pub fn values(&self) -> Vec<Value> {
        if self.inclusive {
            (self.start..=self.end).map(Value::Int).collect()
        } else {
            (self.start..self.end).map(Value::Int).collect()
        }
    }
}

/// Runtime value in the Able interpreter.
#[derive(Clone)]
pub enum Value {
    Nil,
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Heap<String>),
    List(Heap<Vec<Value>>),
    Range(RangeValue),
    Struct(Heap<StructValue>),
    /// Sum type variant, e.g. `ProcStatus.Failed(err)`.
    Variant {
        type_name: Name,
        variant_name: Name,
        fields: Heap<Vec<Value>>,
    },
    Error(Heap<ErrorValue>),
    Function(Heap<FunctionValue>),
    Builtin(BuiltinFunction),
    /// Lazily started task handle.
    Proc(TaskHandle),
    /// Eagerly scheduled task handle.
    Future(TaskHandle),
    /// Generator-backed iterator.
    Iterator(GeneratorHandle),
    /// `gen` inside an iterator literal body.
    GeneratorController(WeakGenerator),
    /// End-of-sequence marker returned by `next()`.
    IteratorEnd,
}

impl Value {
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    pub fn struct_value(type_name: Name, fields: Vec<(Name, Value)>) -> Self {
        Value::Struct(Heap::new(StructValue { type_name, fields }))
    }

    pub fn variant(type_name: Name, variant_name: Name, fields: Vec<Value>) -> Self {
        Value::Variant {
            type_name,
            variant_name,
            fields: Heap::new(fields),
        }
    }

    pub fn error(message: impl Into<String>, payload: Option<Value>) -> Self {
        Value::Error(Heap::new(ErrorValue {
            message: message.into(),
            payload,
        }))
    }

    pub fn function(params: Vec<Name>, body: ExprId, env: Environment) -> Self {
        Value::Function(Heap::new(FunctionValue { params, body, env }))
    }

    /// Type name used in error messages and method lookup of primitives.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Void => "void",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Str(_) => "String",
            Value::List(_) => "Array",
            Value::Range(_) => "Range",
            Value::Struct(_) => "struct",
            Value::Variant { .. } => "variant",
            Value::Error(_) => "Error",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Proc(_) => "Proc",
            Value::Future(_) => "Future",
            Value::Iterator(_) => "Iterator",
            Value::GeneratorController(_) => "Generator",
            Value::IteratorEnd => "IteratorEnd",
        }
    }

    /// `false` and `nil` are falsy; everything else is truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render with names resolved through `interner`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> DisplayValue<'a> {
        DisplayValue {
            value: self,
            interner,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)
            | (Value::Void, Value::Void)
            | (Value::IteratorEnd, Value::IteratorEnd) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (
                Value::Variant {
                    type_name: ta,
                    variant_name: va,
                    fields: fa,
                },
                Value::Variant {
                    type_name: tb,
                    variant_name: vb,
                    fields: fb,
                },
            ) => ta == tb && va == vb && fa == fb,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Proc(a), Value::Proc(b)) | (Value::Future(a), Value::Future(b)) => a.ptr_eq(b),
            (Value::Iterator(a), Value::Iterator(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Void => write!(f, "Void"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({:?})", s.as_str()),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Range(r) => write!(f, "{r:?}"),
            Value::Struct(s) => write!(f, "{:?}", &**s),
            Value::Variant {
                type_name,
                variant_name,
                fields,
            } => write!(f, "Variant({type_name:?}, {variant_name:?}, {fields:?})"),
            Value::Error(e) => write!(f, "Error({:?})", e.message),
            Value::Function(_) => write!(f, "Function"),
            Value::Builtin(b) => write!(f, "Builtin({})", b.name),
            Value::Proc(h) => write!(f, "Proc(#{})", h.id()),
            Value::Future(h) => write!(f, "Future(#{})", h.id()),
            Value::Iterator(_) => write!(f, "Iterator"),
            Value::GeneratorController(_) => write!(f, "GeneratorController"),
            Value::IteratorEnd => write!(f, "IteratorEnd"),
        }
    }
}

/// `Display` adapter returned by `Value::display`.
pub struct DisplayValue<'a> {
    value: &'a Value,
    interner: &'a StringInterner,
}

impl DisplayValue<'_> {
    fn nested<'b>(&'b self, value: &'b Value) -> DisplayValue<'b> {
        DisplayValue {
            value,
            interner: self.interner,
        }
    }
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Void => write!(f, "void"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{}", s.as_str()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.nested(item))?;
                }
                write!(f, "]")
            }
            Value::Range(r) => {
                let op = if r.inclusive { "..." } else { ".." };
                write!(f, "{}{op}{}", r.start, r.end)
            }
            Value::Struct(s) => {
                write!(f, "{} {{", self.interner.lookup(s.type_name))?;
                for (i, (name, value)) in s.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{}: {}", self.interner.lookup(*name), self.nested(value))?;
                }
                write!(f, " }}")
            }
            Value::Variant {
                variant_name,
                fields,
                ..
            } => {
                write!(f, "{}", self.interner.lookup(*variant_name))?;
                if !fields.is_empty() {
                    write!(f, "(")?;
                    for (i, field) in fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.nested(field))?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Value::Error(e) => write!(f, "error: {}", e.message),
            Value::Function(_) => write!(f, "<function>"),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
            Value::Proc(h) => write!(f, "<proc #{}>", h.id()),
            Value::Future(h) => write!(f, "<future #{}>", h.id()),
            Value::Iterator(_) => write!(f, "<iterator>"),
            Value::GeneratorController(_) => write!(f, "<generator>"),
            Value::IteratorEnd => write!(f, "IteratorEnd"),
        }
    }
}
