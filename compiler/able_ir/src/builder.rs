//! Programmatic AST construction.
//!
//! The evaluator has no parser in front of it; embedders and tests
//! assemble programs with `AstBuilder` and hand the finished arena to an
//! interpreter.

use crate::ast::{
    BinaryOp, BindingPattern, ExprKind, FieldInit, MatchArm, MatchPattern, MatchPatternId,
    OrClause, UnaryOp,
};
use crate::{Expr, ExprArena, ExprId, Name, SharedInterner, Span};

/// Builder for one program's arena.
pub struct AstBuilder {
    arena: ExprArena,
    interner: SharedInterner,
}

impl AstBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        AstBuilder {
            arena: ExprArena::new(),
            interner,
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn finish(self) -> ExprArena {
        self.arena
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, Span::DUMMY))
    }

    // Literals

    pub fn int(&mut self, n: i64) -> ExprId {
        self.expr(ExprKind::Int(n))
    }

    pub fn float(&mut self, f: f64) -> ExprId {
        self.expr(ExprKind::Float(f))
    }

    pub fn bool(&mut self, b: bool) -> ExprId {
        self.expr(ExprKind::Bool(b))
    }

    pub fn str(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.expr(ExprKind::Str(name))
    }

    pub fn nil(&mut self) -> ExprId {
        self.expr(ExprKind::Nil)
    }

    pub fn void(&mut self) -> ExprId {
        self.expr(ExprKind::Void)
    }

    pub fn ident(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.expr(ExprKind::Ident(name))
    }

    // Operators

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    // Bindings

    /// `name := init`
    pub fn declare(&mut self, name: &str, init: ExprId) -> ExprId {
        let pattern = BindingPattern::Name(self.name(name));
        self.declare_pattern(pattern, init)
    }

    pub fn declare_pattern(&mut self, pattern: BindingPattern, init: ExprId) -> ExprId {
        let pattern = self.arena.alloc_binding_pattern(pattern);
        self.expr(ExprKind::Declare { pattern, init })
    }

    /// `name = value`
    pub fn assign(&mut self, name: &str, value: ExprId) -> ExprId {
        let target = self.name(name);
        self.expr(ExprKind::Assign {
            target,
            op: None,
            value,
        })
    }

    /// `name op= value`
    pub fn compound_assign(&mut self, name: &str, op: BinaryOp, value: ExprId) -> ExprId {
        let target = self.name(name);
        self.expr(ExprKind::Assign {
            target,
            op: Some(op),
            value,
        })
    }

    // Data

    pub fn list(&mut self, items: impl IntoIterator<Item = ExprId>) -> ExprId {
        let range = self.arena.alloc_expr_list(items);
        self.expr(ExprKind::List(range))
    }

    pub fn range(&mut self, start: ExprId, end: ExprId, inclusive: bool) -> ExprId {
        self.expr(ExprKind::Range {
            start,
            end,
            inclusive,
        })
    }

    pub fn struct_lit(&mut self, name: &str, fields: &[(&str, ExprId)]) -> ExprId {
        let name = self.name(name);
        let inits: Vec<FieldInit> = fields
            .iter()
            .map(|&(field, value)| FieldInit {
                name: self.name(field),
                value,
            })
            .collect();
        let fields = self.arena.alloc_field_inits(inits);
        self.expr(ExprKind::StructLit { name, fields })
    }

    pub fn index(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Index { receiver, index })
    }

    pub fn field(&mut self, receiver: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        self.expr(ExprKind::Field { receiver, field })
    }

    // Calls

    pub fn call(&mut self, func: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        self.expr(ExprKind::Call { func, args })
    }

    /// Call of a function bound to `name`.
    pub fn call_named(&mut self, name: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let func = self.ident(name);
        self.call(func, args)
    }

    pub fn method(
        &mut self,
        receiver: ExprId,
        method: &str,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let method = self.name(method);
        let args = self.arena.alloc_expr_list(args);
        self.expr(ExprKind::MethodCall {
            receiver,
            method,
            args,
        })
    }

    pub fn lambda(&mut self, params: &[&str], body: ExprId) -> ExprId {
        let names: Vec<Name> = params.iter().map(|p| self.name(p)).collect();
        let params = self.arena.alloc_params(names);
        self.expr(ExprKind::Lambda { params, body })
    }

    // Control flow

    pub fn block(&mut self, stmts: impl IntoIterator<Item = ExprId>) -> ExprId {
        let range = self.arena.alloc_expr_list(stmts);
        self.expr(ExprKind::Block(range))
    }

    pub fn if_(&mut self, cond: ExprId, then_branch: ExprId, clauses: &[OrClause]) -> ExprId {
        let clauses = self.arena.alloc_or_clauses(clauses.iter().copied());
        self.expr(ExprKind::If {
            cond,
            then_branch,
            clauses,
        })
    }

    /// `or cond { body }`
    pub fn or_clause(cond: ExprId, body: ExprId) -> OrClause {
        OrClause { cond, body }
    }

    /// Trailing `or { body }`
    pub fn else_clause(body: ExprId) -> OrClause {
        OrClause {
            cond: ExprId::INVALID,
            body,
        }
    }

    pub fn while_(&mut self, cond: ExprId, body: ExprId) -> ExprId {
        self.expr(ExprKind::While { cond, body })
    }

    pub fn loop_(&mut self, body: ExprId) -> ExprId {
        self.expr(ExprKind::Loop { body })
    }

    /// `for name in iterable { body }`
    pub fn for_(&mut self, name: &str, iterable: ExprId, body: ExprId) -> ExprId {
        let pattern = BindingPattern::Name(self.name(name));
        self.for_pattern(pattern, iterable, body)
    }

    pub fn for_pattern(
        &mut self,
        pattern: BindingPattern,
        iterable: ExprId,
        body: ExprId,
    ) -> ExprId {
        let pattern = self.arena.alloc_binding_pattern(pattern);
        self.expr(ExprKind::For {
            pattern,
            iterable,
            body,
        })
    }

    pub fn match_(&mut self, subject: ExprId, arms: &[MatchArm]) -> ExprId {
        let arms = self.arena.alloc_arms(arms.iter().copied());
        self.expr(ExprKind::Match { subject, arms })
    }

    pub fn arm(&mut self, pattern: MatchPattern, guard: Option<ExprId>, body: ExprId) -> MatchArm {
        MatchArm {
            pattern: self.pattern(pattern),
            guard: guard.unwrap_or(ExprId::INVALID),
            body,
        }
    }

    pub fn pattern(&mut self, pattern: MatchPattern) -> MatchPatternId {
        self.arena.alloc_match_pattern(pattern)
    }

    /// `Name(sub, patterns)`
    pub fn variant_pattern(&self, name: &str, fields: Vec<MatchPattern>) -> MatchPattern {
        MatchPattern::Variant {
            name: self.name(name),
            fields,
        }
    }

    pub fn binding_pattern(&self, name: &str) -> MatchPattern {
        MatchPattern::Binding(self.name(name))
    }

    // Exits

    pub fn break_(&mut self) -> ExprId {
        self.expr(ExprKind::Break {
            label: None,
            value: ExprId::INVALID,
        })
    }

    pub fn break_with(&mut self, value: ExprId) -> ExprId {
        self.expr(ExprKind::Break { label: None, value })
    }

    pub fn break_label(&mut self, label: &str, value: Option<ExprId>) -> ExprId {
        let label = Some(self.name(label));
        self.expr(ExprKind::Break {
            label,
            value: value.unwrap_or(ExprId::INVALID),
        })
    }

    pub fn continue_(&mut self) -> ExprId {
        self.expr(ExprKind::Continue { label: None })
    }

    pub fn continue_label(&mut self, label: &str) -> ExprId {
        let label = Some(self.name(label));
        self.expr(ExprKind::Continue { label })
    }

    pub fn return_(&mut self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Return(value.unwrap_or(ExprId::INVALID)))
    }

    pub fn raise(&mut self, value: ExprId) -> ExprId {
        self.expr(ExprKind::Raise(value))
    }

    pub fn rescue(&mut self, body: ExprId, arms: &[MatchArm]) -> ExprId {
        let arms = self.arena.alloc_arms(arms.iter().copied());
        self.expr(ExprKind::Rescue { body, arms })
    }

    pub fn ensure(&mut self, body: ExprId, cleanup: ExprId) -> ExprId {
        self.expr(ExprKind::Ensure { body, cleanup })
    }

    pub fn breakpoint(&mut self, label: &str, body: ExprId) -> ExprId {
        let label = self.name(label);
        self.expr(ExprKind::Breakpoint { label, body })
    }

    // Tasks and generators

    pub fn proc_(&mut self, body: ExprId) -> ExprId {
        self.expr(ExprKind::Proc(body))
    }

    pub fn spawn(&mut self, body: ExprId) -> ExprId {
        self.expr(ExprKind::Spawn(body))
    }

    /// `Iterator { binding => stmts }`
    pub fn iterator(&mut self, binding: &str, stmts: impl IntoIterator<Item = ExprId>) -> ExprId {
        let binding = self.name(binding);
        let body = self.arena.alloc_expr_list(stmts);
        self.expr(ExprKind::IteratorLiteral { binding, body })
    }
}
