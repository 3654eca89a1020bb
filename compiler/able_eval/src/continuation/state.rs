//! Per-construct saved state.

use crate::generator::GeneratorHandle;
use crate::{ControlAction, Environment, EvalResult, Value};

pub(crate) enum FrameState {
    Block(BlockState),
    If(IfStage),
    While(WhileState),
    For(ForState),
    Match(MatchState),
    Rescue(RescueStage),
    Ensure(EnsureStage),
    /// Values of the operands that finished before one suspended.
    Operands(Vec<Value>),
    /// Every operand finished; the operation itself suspended.
    Applying(Vec<Value>),
}

impl FrameState {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            FrameState::Block(_) => "block",
            FrameState::If(_) => "if",
            FrameState::While(_) => "while",
            FrameState::For(_) => "for",
            FrameState::Match(_) => "match",
            FrameState::Rescue(_) => "rescue",
            FrameState::Ensure(_) => "ensure",
            FrameState::Operands(_) => "operands",
            FrameState::Applying(_) => "applying",
        }
    }
}

/// Block scope and the index of the statement to re-run.
pub(crate) struct BlockState {
    pub(crate) env: Environment,
    pub(crate) index: usize,
}

/// Which part of an `if` was running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum IfStage {
    Condition,
    Then,
    OrCondition(usize),
    OrBody(usize),
}

pub(crate) struct WhileState {
    /// Suspended inside the body: do not re-test the condition.
    pub(crate) in_body: bool,
    pub(crate) result: Value,
}

pub(crate) enum ForSource {
    /// Snapshot of a list or range.
    Static { values: Vec<Value>, index: usize },
    Generator(GeneratorHandle),
    /// User object with a `next` method.
    Object(Value),
}

pub(crate) struct ForState {
    pub(crate) source: ForSource,
    /// Scope of the element whose body was running, already bound.
    pub(crate) iteration_env: Option<Environment>,
    pub(crate) result: Value,
}

pub(crate) enum MatchStage {
    Guard { arm: usize, env: Environment },
    Body { arm: usize, env: Environment },
}

pub(crate) struct MatchState {
    pub(crate) stage: MatchStage,
    pub(crate) subject: Value,
}

pub(crate) enum RescueStage {
    Body,
    /// Selecting an arm for `raised`; a guard suspended.
    Matching { raised: Value },
    Handler {
        arm: usize,
        env: Environment,
        raised: Value,
    },
}

pub(crate) enum EnsureStage {
    Body,
    /// Cleanup suspended; `outcome` is delivered once it finishes.
    Cleanup { outcome: Outcome },
}

/// Exit of an `ensure` body, held while the cleanup runs.
pub(crate) enum Outcome {
    Value(Value),
    Exit(ControlAction),
}

impl Outcome {
    pub(crate) fn from_result(result: EvalResult) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(action) => Outcome::Exit(action),
        }
    }

    pub(crate) fn into_result(self) -> EvalResult {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::Exit(action) => Err(action),
        }
    }
}
