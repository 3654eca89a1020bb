//! Continuation State Store.
//!
//! Suspendable constructs (blocks, `if`, `while`, `for`, `match`, `rescue`,
//! `ensure`) and compound expressions (operators, calls, literals) record
//! their progress here when a yield unwinds through them, and pick it back
//! up when the same task or generator evaluates them again. Each task and
//! each generator owns its own `ContinuationFrames`, so two instances
//! running the same AST never share state.
//!
//! # Keys
//!
//! A state is keyed by the construct's `ExprId` plus its nesting depth
//! among suspendable constructs on the current evaluation path. Depth
//! separates recursive activations of the same function body. The depth
//! counter restarts at zero each time the owner is driven, so a replay
//! walks the same path and lands on the same keys.
//!
//! # Take on entry, save on suspend
//!
//! A construct removes its state when it starts, and writes a fresh one
//! only if a suspension passes through it. Completion, errors, `break`,
//! and `return` therefore leave nothing behind.
//!
//! # Resumed calls
//!
//! A call whose invocation suspended is invoked again on resume with the
//! argument values it saved. While that re-invocation runs the frames are
//! marked as resuming a call, which is how `proc_yield` and `gen.yield`
//! know their suspension already happened.

mod state;

use able_ir::ExprId;
use rustc_hash::FxHashMap;

use crate::{ControlAction, LocalScope};

pub(crate) use state::{
    BlockState, EnsureStage, ForSource, ForState, FrameState, IfStage, MatchStage, MatchState,
    Outcome, RescueStage, WhileState,
};

/// Where one activation of a suspendable construct keeps its progress.
///
/// A detached slot (no task or generator being driven) never stores
/// anything: `take` finds nothing and `save` only passes the action on.
pub(crate) struct FrameSlot {
    bound: Option<(FramesRef, FrameKey)>,
}

impl FrameSlot {
    pub(crate) fn detached() -> Self {
        FrameSlot { bound: None }
    }

    /// Enter `node` in `frames`. Pair with `leave`.
    pub(crate) fn enter(frames: FramesRef, node: ExprId) -> Self {
        let key = frames.borrow_mut().enter(node);
        FrameSlot {
            bound: Some((frames, key)),
        }
    }

    pub(crate) fn leave(&self) {
        if let Some((frames, _)) = &self.bound {
            frames.borrow_mut().leave();
        }
    }

    pub(crate) fn take(&self) -> Option<FrameState> {
        let (frames, key) = self.bound.as_ref()?;
        frames.borrow_mut().take(*key)
    }

    /// Save the state built by `state` if `action` suspends.
    pub(crate) fn save(
        &self,
        action: ControlAction,
        state: impl FnOnce() -> FrameState,
    ) -> ControlAction {
        match &self.bound {
            Some((frames, key)) if action.is_suspension() => {
                frames.borrow_mut().suspend(*key, action, state())
            }
            _ => action,
        }
    }

    /// Run `invoke` with the owner marked as resuming a call or not.
    ///
    /// Every call sets the mark for exactly its own invocation, so a
    /// fresh call nested inside a resumed one never sees it.
    pub(crate) fn invoke<T>(&self, resuming: bool, invoke: impl FnOnce() -> T) -> T {
        let Some((frames, _)) = &self.bound else {
            return invoke();
        };
        let outer = frames.borrow_mut().set_resuming_call(resuming);
        let result = invoke();
        frames.borrow_mut().set_resuming_call(outer);
        result
    }
}

/// Identity of one activation of a suspendable construct.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameKey {
    node: ExprId,
    depth: u32,
}

/// Saved progress for every suspended construct of one task or generator.
#[derive(Default)]
pub struct ContinuationFrames {
    states: FxHashMap<FrameKey, FrameState>,
    depth: u32,
    /// A call whose invocation suspended is being invoked again.
    resuming_call: bool,
}

pub type FramesRef = LocalScope<ContinuationFrames>;

impl ContinuationFrames {
    /// Enter a suspendable construct and return its key.
    #[inline]
    pub(crate) fn enter(&mut self, node: ExprId) -> FrameKey {
        self.depth = self.depth.saturating_add(1);
        FrameKey {
            node,
            depth: self.depth,
        }
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Start a new drive of the owner.
    pub(crate) fn reset_depth(&mut self) {
        self.depth = 0;
    }

    pub(crate) fn take(&mut self, key: FrameKey) -> Option<FrameState> {
        let state = self.states.remove(&key);
        if state.is_some() {
            tracing::trace!(node = key.node.raw(), depth = key.depth, "resuming frame");
        }
        state
    }

    /// Record `state` if `action` suspends; pass `action` on either way.
    pub(crate) fn suspend(
        &mut self,
        key: FrameKey,
        action: ControlAction,
        state: FrameState,
    ) -> ControlAction {
        if action.is_suspension() {
            tracing::trace!(
                node = key.node.raw(),
                depth = key.depth,
                kind = state.kind(),
                "saving frame"
            );
            self.states.insert(key, state);
        }
        action
    }

    /// Set the resuming-call mark, returning the previous one.
    pub(crate) fn set_resuming_call(&mut self, resuming: bool) -> bool {
        std::mem::replace(&mut self.resuming_call, resuming)
    }

    /// Whether the call being invoked is resuming after its own suspension.
    pub fn is_resuming_call(&self) -> bool {
        self.resuming_call
    }

    /// Drop all saved states.
    pub fn clear(&mut self) {
        self.states.clear();
        self.depth = 0;
        self.resuming_call = false;
    }

    /// Number of constructs currently suspended.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
