//! AST node definitions.
//!
//! Every payload in `ExprKind` is `Copy`: children are `ExprId`s, lists are
//! ranges into arena storage, patterns are ids into pattern tables. The
//! evaluator copies the kind out of the arena before dispatching on it.

mod operators;
mod patterns;
mod ranges;

pub use operators::{BinaryOp, UnaryOp};
pub use patterns::{BindingPattern, BindingPatternId, MatchPattern, MatchPatternId};
pub use ranges::{ArmRange, FieldInitRange, OrClauseRange, ParamRange};

use crate::{ExprId, ExprRange, Name, Span};

/// Expression node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Expression variants.
///
/// Able is expression-oriented: blocks hold a list of expressions and
/// evaluate to the last one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExprKind {
    // Literals
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Name),
    Nil,
    Void,

    Ident(Name),

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },

    /// `pattern := init`
    Declare {
        pattern: BindingPatternId,
        init: ExprId,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        target: Name,
        op: Option<BinaryOp>,
        value: ExprId,
    },

    /// `[a, b, c]`
    List(ExprRange),
    /// `start..end` or `start...end`
    Range {
        start: ExprId,
        end: ExprId,
        inclusive: bool,
    },
    /// `Point { x: 1, y: 2 }`
    StructLit {
        name: Name,
        fields: FieldInitRange,
    },
    Index {
        receiver: ExprId,
        index: ExprId,
    },
    Field {
        receiver: ExprId,
        field: Name,
    },

    Call {
        func: ExprId,
        args: ExprRange,
    },
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
    },
    /// `fn(a, b) { body }`
    Lambda {
        params: ParamRange,
        body: ExprId,
    },

    // Suspendable control flow
    Block(ExprRange),
    /// `if cond { .. } or cond2 { .. } or { .. }`
    If {
        cond: ExprId,
        then_branch: ExprId,
        clauses: OrClauseRange,
    },
    While {
        cond: ExprId,
        body: ExprId,
    },
    Loop {
        body: ExprId,
    },
    For {
        pattern: BindingPatternId,
        iterable: ExprId,
        body: ExprId,
    },
    Match {
        subject: ExprId,
        arms: ArmRange,
    },

    // Non-local exits
    Break {
        label: Option<Name>,
        value: ExprId,
    },
    Continue {
        label: Option<Name>,
    },
    Return(ExprId),
    Raise(ExprId),

    /// `body rescue { arms }`
    Rescue {
        body: ExprId,
        arms: ArmRange,
    },
    /// `body ensure { cleanup }`
    Ensure {
        body: ExprId,
        cleanup: ExprId,
    },
    /// `breakpoint 'label { body }`
    Breakpoint {
        label: Name,
        body: ExprId,
    },

    // Cooperative tasks
    /// `proc expr`: lazily started task.
    Proc(ExprId),
    /// `spawn expr`: eagerly scheduled task.
    Spawn(ExprId),
    /// `Iterator { gen => body }`
    IteratorLiteral {
        binding: Name,
        body: ExprRange,
    },
}

/// One `or` clause of an `if`. `cond` is `INVALID` for the trailing
/// unconditional clause.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrClause {
    pub cond: ExprId,
    pub body: ExprId,
}

/// A `match` or `rescue` arm. `guard` is `INVALID` when absent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchArm {
    pub pattern: MatchPatternId,
    pub guard: ExprId,
    pub body: ExprId,
}

/// `name: value` in a struct literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldInit {
    pub name: Name,
    pub value: ExprId,
}
