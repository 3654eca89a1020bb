//! Generator-backed iterators.
//!
//! An iterator literal `Iterator { gen => body }` produces a generator: a
//! statement list, a cursor into it, a slot for the value handed over by
//! `gen.yield`, and its own continuation frames. `next()` resumes the body
//! from the cursor; the interpreter side lives in
//! `interpreter::generators`.

use able_ir::ExprRange;
use bitflags::bitflags;

use crate::continuation::FramesRef;
use crate::environment::WeakScope;
use crate::{ControlAction, Environment, LocalScope, Value};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct GeneratorFlags: u8 {
        const STARTED = 1 << 0;
        /// `next()` is on the Rust stack.
        const BUSY = 1 << 1;
        /// Body finished, stopped, or failed.
        const DONE = 1 << 2;
        const CLOSED = 1 << 3;
    }
}

pub struct GeneratorState {
    pub(crate) env: Environment,
    pub(crate) body: ExprRange,
    pub(crate) cursor: usize,
    pub(crate) flags: GeneratorFlags,
    /// Value of the last `gen.yield`, taken by `next()`.
    pub(crate) pending: Option<Value>,
    /// Failure re-raised by every `next()` after it ended the body.
    pub(crate) stored_error: Option<ControlAction>,
    pub(crate) frames: FramesRef,
}

/// Shared handle to a generator. Equality is identity.
#[derive(Clone)]
pub struct GeneratorHandle(LocalScope<GeneratorState>);

impl GeneratorHandle {
    pub(crate) fn new(env: Environment, body: ExprRange) -> Self {
        GeneratorHandle(LocalScope::new(GeneratorState {
            env,
            body,
            cursor: 0,
            flags: GeneratorFlags::empty(),
            pending: None,
            stored_error: None,
            frames: FramesRef::default(),
        }))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &GeneratorHandle) -> bool {
        self.0.ptr_eq(&other.0)
    }

    pub fn flags(&self) -> GeneratorFlags {
        self.0.borrow().flags
    }

    pub fn is_finished(&self) -> bool {
        self.flags()
            .intersects(GeneratorFlags::DONE | GeneratorFlags::CLOSED)
    }

    pub(crate) fn set_flag(&self, flag: GeneratorFlags, on: bool) {
        self.0.borrow_mut().flags.set(flag, on);
    }

    pub(crate) fn state(&self) -> &LocalScope<GeneratorState> {
        &self.0
    }

    pub(crate) fn frames(&self) -> FramesRef {
        self.0.borrow().frames.clone()
    }

    pub(crate) fn downgrade(&self) -> WeakGenerator {
        WeakGenerator(self.0.downgrade())
    }

    /// Mark finished and drop saved state. Idempotent.
    pub(crate) fn close(&self) {
        let frames = {
            let mut state = self.0.borrow_mut();
            state.flags.insert(GeneratorFlags::CLOSED | GeneratorFlags::DONE);
            state.pending = None;
            state.frames.clone()
        };
        frames.borrow_mut().clear();
    }
}

/// The `gen` binding inside a generator body.
///
/// Weak so the body's environment does not keep its own generator alive.
#[derive(Clone)]
pub struct WeakGenerator(WeakScope<GeneratorState>);

impl WeakGenerator {
    pub(crate) fn upgrade(&self) -> Option<GeneratorHandle> {
        self.0.upgrade().map(GeneratorHandle)
    }
}
