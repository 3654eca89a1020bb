//! Names interned once at construction so dispatch compares `u32`s.

use able_ir::{Name, StringInterner};

use crate::task::ProcErrorNames;

/// Member names with built-in meaning on handles and generators.
#[derive(Clone, Copy)]
pub(crate) struct MemberNames {
    pub(crate) value: Name,
    pub(crate) status: Name,
    pub(crate) cancel: Name,
    pub(crate) next: Name,
    pub(crate) close: Name,
    pub(crate) yield_: Name,
    pub(crate) stop: Name,
    pub(crate) iterator: Name,
    pub(crate) message: Name,
    pub(crate) len: Name,
}

impl MemberNames {
    fn new(interner: &StringInterner) -> Self {
        Self {
            value: interner.intern("value"),
            status: interner.intern("status"),
            cancel: interner.intern("cancel"),
            next: interner.intern("next"),
            close: interner.intern("close"),
            yield_: interner.intern("yield"),
            stop: interner.intern("stop"),
            iterator: interner.intern("iterator"),
            message: interner.intern("message"),
            len: interner.intern("len"),
        }
    }
}

/// `ProcStatus` variant names.
#[derive(Clone, Copy)]
pub(crate) struct StatusNames {
    pub(crate) proc_status: Name,
    pub(crate) pending: Name,
    pub(crate) resolved: Name,
    pub(crate) cancelled: Name,
    pub(crate) failed: Name,
}

impl StatusNames {
    fn new(interner: &StringInterner) -> Self {
        Self {
            proc_status: interner.intern("ProcStatus"),
            pending: interner.intern("Pending"),
            resolved: interner.intern("Resolved"),
            cancelled: interner.intern("Cancelled"),
            failed: interner.intern("Failed"),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct InternedNames {
    pub(crate) members: MemberNames,
    pub(crate) status: StatusNames,
    pub(crate) proc_error: ProcErrorNames,
}

impl InternedNames {
    pub(crate) fn new(interner: &StringInterner) -> Self {
        Self {
            members: MemberNames::new(interner),
            status: StatusNames::new(interner),
            proc_error: ProcErrorNames {
                proc_error: interner.intern("ProcError"),
                details: interner.intern("details"),
            },
        }
    }
}
