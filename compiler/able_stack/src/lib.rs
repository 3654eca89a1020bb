//! Stack growth guard for the Able evaluator.
//!
//! Evaluation is recursive over the AST, and resuming a suspended task
//! replays that recursion down to the suspension point. Every recursive
//! evaluation entry goes through `ensure_sufficient_stack` so deeply
//! nested programs grow the stack instead of overflowing it.

/// Space that must remain on the current stack before `f` runs directly.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment.
#[cfg(not(target_arch = "wasm32"))]
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, switching to a new stack segment first when the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
