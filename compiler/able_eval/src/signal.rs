//! Non-local control transfer.
//!
//! Every evaluation step returns `EvalResult`. The `Err` side carries a
//! `ControlAction`: either a control signal unwinding toward the frame that
//! consumes it, or a host error. Suspendable constructs inspect the action
//! to decide between saving their progress (`is_suspension`), exiting, or
//! passing it on.

use able_ir::Name;

use crate::errors::EvalError;
use crate::Value;

/// Result of evaluating an expression.
pub type EvalResult<T = Value> = Result<T, ControlAction>;

/// Signal or error unwinding the evaluator stack.
#[derive(Clone, Debug)]
pub enum ControlAction {
    /// Cooperative task suspension (`proc_yield`, blocked channel/mutex).
    Yield,
    Return(Value),
    Break { label: Option<Name>, value: Value },
    /// A labeled break resolved against an enclosing breakpoint.
    BreakLabel { label: Name, value: Value },
    Continue { label: Option<Name> },
    /// User-level `raise`.
    Raise(Value),
    /// `gen.yield(value)`; the payload waits in the generator's slot.
    GeneratorYield,
    /// `gen.stop()`
    GeneratorStop,
    Error(EvalError),
}

impl ControlAction {
    /// Whether this action suspends evaluation rather than exiting it.
    ///
    /// Both yield kinds suspend every construct they pass through: a task
    /// yield raised inside a generator body pulled by that task must keep
    /// the generator's progress too.
    #[inline]
    pub fn is_suspension(&self) -> bool {
        matches!(self, ControlAction::Yield | ControlAction::GeneratorYield)
    }

    /// Short name used in logs and defect reports.
    pub fn describe(&self) -> &'static str {
        match self {
            ControlAction::Yield => "yield",
            ControlAction::Return(_) => "return",
            ControlAction::Break { .. } => "break",
            ControlAction::BreakLabel { .. } => "labeled break",
            ControlAction::Continue { .. } => "continue",
            ControlAction::Raise(_) => "raise",
            ControlAction::GeneratorYield => "generator yield",
            ControlAction::GeneratorStop => "generator stop",
            ControlAction::Error(_) => "error",
        }
    }
}

impl From<EvalError> for ControlAction {
    #[inline]
    fn from(err: EvalError) -> Self {
        ControlAction::Error(err)
    }
}

/// What a loop does with an action escaping its body.
pub(crate) enum LoopAction {
    /// Start the next iteration.
    Continue,
    /// Leave the loop with this value.
    Break(Value),
    /// Leave the loop and propagate.
    Exit(ControlAction),
}
