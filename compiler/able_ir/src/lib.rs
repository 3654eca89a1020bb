//! Able IR - Flat arena AST for the Able interpreter.
//!
//! # Architecture
//!
//! Expressions live in a single `ExprArena` and refer to each other by
//! `ExprId(u32)` index. The index doubles as a stable node identity: the
//! evaluator keys resumable control-flow state on it, so two tasks running
//! the same function body never share progress records.
//!
//! - `Name`: interned identifier, resolved through `StringInterner`
//! - `ExprKind`: `Copy` payloads only (ids, ranges, names, scalars)
//! - `AstBuilder`: programmatic construction of programs

mod arena;
mod ast;
mod builder;
mod expr_id;
mod interner;
mod name;
mod span;

pub use arena::{ExprArena, SharedArena};
pub use ast::{
    ArmRange, BinaryOp, BindingPattern, BindingPatternId, Expr, ExprKind, FieldInit,
    FieldInitRange, MatchArm, MatchPattern, MatchPatternId, OrClause, OrClauseRange, ParamRange,
    UnaryOp,
};
pub use builder::AstBuilder;
pub use expr_id::{ExprId, ExprRange};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
