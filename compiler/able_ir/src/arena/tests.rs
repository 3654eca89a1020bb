use super::*;
use crate::{ExprKind, Span};
use pretty_assertions::assert_eq;

#[test]
fn test_alloc_and_get_expr() {
    let mut arena = ExprArena::new();
    let a = arena.alloc_expr(Expr::new(ExprKind::Int(1), Span::DUMMY));
    let b = arena.alloc_expr(Expr::new(ExprKind::Bool(true), Span::new(3, 7)));

    assert_ne!(a, b);
    assert_eq!(arena.get_expr(a).kind, ExprKind::Int(1));
    assert_eq!(arena.get_expr(b).span, Span::new(3, 7));
    assert_eq!(arena.expr_count(), 2);
}

#[test]
fn test_expr_lists_do_not_overlap() {
    let mut arena = ExprArena::new();
    let ids: Vec<ExprId> = (0..4)
        .map(|n| arena.alloc_expr(Expr::new(ExprKind::Int(n), Span::DUMMY)))
        .collect();

    let first = arena.alloc_expr_list(ids[..2].iter().copied());
    let second = arena.alloc_expr_list(ids[2..].iter().copied());

    assert_eq!(arena.get_expr_list(first), &ids[..2]);
    assert_eq!(arena.get_expr_list(second), &ids[2..]);
}

#[test]
fn test_empty_list() {
    let mut arena = ExprArena::new();
    let range = arena.alloc_expr_list(std::iter::empty());
    assert!(range.is_empty());
    assert!(arena.get_expr_list(range).is_empty());
}

#[test]
fn test_shared_arena_derefs() {
    let mut arena = ExprArena::new();
    let id = arena.alloc_expr(Expr::new(ExprKind::Nil, Span::DUMMY));
    let shared = SharedArena::new(arena);
    let clone = shared.clone();
    assert_eq!(clone.get_expr(id).kind, ExprKind::Nil);
}
