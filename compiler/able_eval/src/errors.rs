//! Host error types for the evaluator.
//!
//! Host errors are failures of the interpreter itself (bad handle, wrong
//! arity, division by zero). They are distinct from user-level `raise`,
//! which travels as `ControlAction::Raise`.
//!
//! `EvalErrorKind` carries the structured category; factory functions
//! below are the public way to build errors.

use able_ir::Span;

use crate::task::TaskKind;

/// Structured error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Arithmetic
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: String },

    // Type/Operator
    #[error("operator `{op}` cannot be applied to {type_name}")]
    InvalidBinaryOp { type_name: String, op: &'static str },
    #[error("cannot apply operator `{op}` to `{left}` and `{right}`")]
    BinaryTypeMismatch {
        left: String,
        right: String,
        op: &'static str,
    },
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    // Access
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },
    #[error("cannot assign to immutable variable: {name}")]
    ImmutableBinding { name: String },
    #[error("no field {field} on {type_name}")]
    UndefinedField { field: String, type_name: String },
    #[error("no method '{method}' on type {type_name}")]
    UndefinedMethod { method: String, type_name: String },
    #[error("index {index} out of bounds")]
    IndexOutOfBounds { index: i64 },

    // Function
    #[error("{name} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("{type_name} is not callable")]
    NotCallable { type_name: String },

    // Pattern / iteration
    #[error("non-exhaustive match")]
    NonExhaustiveMatch,
    #[error("pattern mismatch: {message}")]
    PatternMismatch { message: String },
    #[error("{type_name} is not iterable")]
    NotIterable { type_name: String },

    // Control flow
    #[error("Labeled continue not supported")]
    LabeledContinue,
    #[error("Unknown break label '{label}'")]
    UnknownBreakLabel { label: String },
    #[error("{keyword} outside of loop")]
    LoopControlOutsideLoop { keyword: &'static str },

    // Tasks
    #[error("{builtin} must be called inside an asynchronous task")]
    OutsideTask { builtin: &'static str },
    #[error("{kind} cancelled")]
    TaskCancelled { kind: TaskKind },
    #[error("{kind} cannot wait on its own handle")]
    SelfAwait { kind: TaskKind },

    // Generators
    #[error("iterator.next re-entered while suspended at yield")]
    GeneratorReentered,
    #[error("Cannot yield from a closed iterator")]
    YieldFromClosedIterator,
    #[error("gen.{method} called outside its generator body")]
    GeneratorControlOutsideBody { method: &'static str },

    // Channels and mutexes
    #[error("Invalid channel handle")]
    InvalidChannelHandle,
    #[error("Invalid mutex handle")]
    InvalidMutexHandle,
    #[error("channel capacity must be non-negative, got {capacity}")]
    NegativeChannelCapacity { capacity: i64 },
    #[error("send on closed channel")]
    SendOnClosedChannel,
    #[error("close of nil channel")]
    CloseOfNilChannel,
    #[error("close of closed channel")]
    CloseOfClosedChannel,
    #[error("Channel {operation} would block outside of proc context")]
    ChannelWouldBlock { operation: &'static str },
    #[error("Mutex already locked")]
    MutexAlreadyLocked,
    #[error("lock of nil mutex outside of proc context")]
    NilMutexLock,

    /// Uncategorized error with a free-form message.
    #[error("{message}")]
    Custom { message: String },
}

/// Host error raised during evaluation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Rendered message; equals `kind.to_string()` for factory-built errors.
    pub message: String,
    pub span: Option<Span>,
}

impl EvalError {
    /// Error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            span: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError {
            kind,
            message,
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    /// Whether this error reports an observed cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, EvalErrorKind::TaskCancelled { .. })
    }
}

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

// Type/Operator

#[cold]
pub fn invalid_binary_op(type_name: &str, op: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidBinaryOp {
        type_name: type_name.to_string(),
        op,
    })
}

#[cold]
pub fn binary_type_mismatch(left: &str, right: &str, op: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BinaryTypeMismatch {
        left: left.to_string(),
        right: right.to_string(),
        op,
    })
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

// Access

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn cannot_assign_immutable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImmutableBinding {
        name: name.to_string(),
    })
}

#[cold]
pub fn no_field(field: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedField {
        field: field.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn no_such_method(method: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index })
}

// Functions

#[cold]
pub fn wrong_arg_count(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

// Patterns and iteration

#[cold]
pub fn non_exhaustive_match() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonExhaustiveMatch)
}

#[cold]
pub fn pattern_mismatch(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::PatternMismatch {
        message: message.into(),
    })
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIterable {
        type_name: type_name.to_string(),
    })
}

// Control flow

#[cold]
pub fn labeled_continue() -> EvalError {
    EvalError::from_kind(EvalErrorKind::LabeledContinue)
}

#[cold]
pub fn unknown_break_label(label: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownBreakLabel {
        label: label.to_string(),
    })
}

#[cold]
pub fn loop_control_outside_loop(keyword: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LoopControlOutsideLoop { keyword })
}

// Tasks

#[cold]
pub fn yield_outside_task() -> EvalError {
    outside_task("proc_yield")
}

#[cold]
pub fn outside_task(builtin: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideTask { builtin })
}

#[cold]
pub fn task_cancelled(kind: TaskKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TaskCancelled { kind })
}

#[cold]
pub fn self_await(kind: TaskKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::SelfAwait { kind })
}

// Generators

#[cold]
pub fn generator_reentered() -> EvalError {
    EvalError::from_kind(EvalErrorKind::GeneratorReentered)
}

#[cold]
pub fn yield_from_closed_iterator() -> EvalError {
    EvalError::from_kind(EvalErrorKind::YieldFromClosedIterator)
}

#[cold]
pub fn generator_control_outside_body(method: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::GeneratorControlOutsideBody { method })
}

// Channels and mutexes

#[cold]
pub fn invalid_channel_handle() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidChannelHandle)
}

#[cold]
pub fn invalid_mutex_handle() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidMutexHandle)
}

#[cold]
pub fn negative_channel_capacity(capacity: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NegativeChannelCapacity { capacity })
}

#[cold]
pub fn send_on_closed_channel() -> EvalError {
    EvalError::from_kind(EvalErrorKind::SendOnClosedChannel)
}

#[cold]
pub fn close_of_nil_channel() -> EvalError {
    EvalError::from_kind(EvalErrorKind::CloseOfNilChannel)
}

#[cold]
pub fn close_of_closed_channel() -> EvalError {
    EvalError::from_kind(EvalErrorKind::CloseOfClosedChannel)
}

#[cold]
pub fn channel_would_block(operation: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ChannelWouldBlock { operation })
}

#[cold]
pub fn mutex_already_locked() -> EvalError {
    EvalError::from_kind(EvalErrorKind::MutexAlreadyLocked)
}

#[cold]
pub fn nil_mutex_lock() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NilMutexLock)
}
