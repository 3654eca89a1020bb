//! Expression arena.
//!
//! Contiguous storage for expressions plus the side lists they reference
//! through ranges and pattern ids.

use std::sync::Arc;

use crate::ast::{
    ArmRange, BindingPattern, BindingPatternId, FieldInit, FieldInitRange, MatchArm,
    MatchPattern, MatchPatternId, OrClause, OrClauseRange, ParamRange,
};
use crate::{Expr, ExprId, ExprRange, Name};

/// Flat storage for one program.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    expr_lists: Vec<ExprId>,
    params: Vec<Name>,
    or_clauses: Vec<OrClause>,
    arms: Vec<MatchArm>,
    field_inits: Vec<FieldInit>,
    binding_patterns: Vec<BindingPattern>,
    match_patterns: Vec<MatchPattern>,
}

/// Start and length of a freshly appended run.
///
/// # Panics
/// Panics if the arena outgrows `u32` indices or a list exceeds `u16::MAX`
/// entries.
fn range_bounds(start: usize, end: usize) -> (u32, u16) {
    let start_u32 =
        u32::try_from(start).unwrap_or_else(|_| panic!("arena exceeded u32::MAX entries"));
    let len = u16::try_from(end - start)
        .unwrap_or_else(|_| panic!("arena list exceeded u16::MAX entries"));
    (start_u32, len)
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("arena exceeded u32::MAX entries"))
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(next_index(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len();
        self.expr_lists.extend(exprs);
        let (start, len) = range_bounds(start, self.expr_lists.len());
        ExprRange::new(start, len)
    }

    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Name>) -> ParamRange {
        let start = self.params.len();
        self.params.extend(params);
        let (start, len) = range_bounds(start, self.params.len());
        ParamRange::new(start, len)
    }

    pub fn get_params(&self, range: ParamRange) -> &[Name] {
        let start = range.start as usize;
        &self.params[start..start + range.len()]
    }

    pub fn alloc_or_clauses(
        &mut self,
        clauses: impl IntoIterator<Item = OrClause>,
    ) -> OrClauseRange {
        let start = self.or_clauses.len();
        self.or_clauses.extend(clauses);
        let (start, len) = range_bounds(start, self.or_clauses.len());
        OrClauseRange::new(start, len)
    }

    pub fn get_or_clauses(&self, range: OrClauseRange) -> &[OrClause] {
        let start = range.start as usize;
        &self.or_clauses[start..start + range.len()]
    }

    pub fn alloc_arms(&mut self, arms: impl IntoIterator<Item = MatchArm>) -> ArmRange {
        let start = self.arms.len();
        self.arms.extend(arms);
        let (start, len) = range_bounds(start, self.arms.len());
        ArmRange::new(start, len)
    }

    pub fn get_arms(&self, range: ArmRange) -> &[MatchArm] {
        let start = range.start as usize;
        &self.arms[start..start + range.len()]
    }

    pub fn alloc_field_inits(
        &mut self,
        inits: impl IntoIterator<Item = FieldInit>,
    ) -> FieldInitRange {
        let start = self.field_inits.len();
        self.field_inits.extend(inits);
        let (start, len) = range_bounds(start, self.field_inits.len());
        FieldInitRange::new(start, len)
    }

    pub fn get_field_inits(&self, range: FieldInitRange) -> &[FieldInit] {
        let start = range.start as usize;
        &self.field_inits[start..start + range.len()]
    }

    pub fn alloc_binding_pattern(&mut self, pattern: BindingPattern) -> BindingPatternId {
        let id = BindingPatternId::new(next_index(self.binding_patterns.len()));
        self.binding_patterns.push(pattern);
        id
    }

    pub fn get_binding_pattern(&self, id: BindingPatternId) -> &BindingPattern {
        &self.binding_patterns[id.index()]
    }

    pub fn alloc_match_pattern(&mut self, pattern: MatchPattern) -> MatchPatternId {
        let id = MatchPatternId::new(next_index(self.match_patterns.len()));
        self.match_patterns.push(pattern);
        id
    }

    pub fn get_match_pattern(&self, id: MatchPatternId) -> &MatchPattern {
        &self.match_patterns[id.index()]
    }
}

/// Immutable, shareable arena handed to interpreters.
#[derive(Clone, Debug)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests;
