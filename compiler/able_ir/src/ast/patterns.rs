//! Binding and match patterns.
//!
//! Patterns are stored in side tables of the arena and referenced from
//! `ExprKind` by id, keeping expression payloads `Copy`.

use crate::{ExprId, Name};

/// Index into the arena's binding pattern table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BindingPatternId(u32);

impl BindingPatternId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        BindingPatternId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the arena's match pattern table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MatchPatternId(u32);

impl MatchPatternId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        MatchPatternId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pattern on the left of `:=` and in `for` heads.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum BindingPattern {
    /// `x`
    Name(Name),
    /// `_`
    Wildcard,
    /// `[a, b, ...rest]`
    List {
        elements: Vec<BindingPattern>,
        rest: Option<Name>,
    },
}

/// Pattern in `match` and `rescue` arms.
#[derive(Clone, PartialEq, Debug)]
pub enum MatchPattern {
    /// `_`
    Wildcard,
    /// Binds the whole subject.
    Binding(Name),
    /// Compares against the value of a literal expression.
    Literal(ExprId),
    /// `Failed(err)`: variant name with positional sub-patterns.
    Variant {
        name: Name,
        fields: Vec<MatchPattern>,
    },
    /// `Point { x, y: 0 }`: struct type test with field sub-patterns.
    Struct {
        name: Name,
        fields: Vec<(Name, MatchPattern)>,
    },
}
