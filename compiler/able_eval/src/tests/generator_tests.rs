//! Iterator literals driven through `next`, `close` and `for`.

use able_ir::{BinaryOp, ExprId};
use pretty_assertions::assert_eq;

use super::test_helpers::TestProgram;
use crate::{EvalErrorKind, Value};

/// `Iterator { gen => gen.yield(v) ... }` for each of `values`.
fn yielding(t: &mut TestProgram, values: &[i64]) -> ExprId {
    let stmts: Vec<_> = values
        .iter()
        .map(|&v| {
            let gen = t.b.ident("gen");
            let v = t.b.int(v);
            t.b.method(gen, "yield", [v])
        })
        .collect();
    t.b.iterator("gen", stmts)
}

fn next_of(t: &mut TestProgram, iterator: &str) -> ExprId {
    let it = t.b.ident(iterator);
    t.b.method(it, "next", [])
}

#[test]
fn next_hands_out_values_then_end() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[1, 2]);
    let bind = t.b.declare("it", it);
    let calls: Vec<_> = (0..4).map(|_| next_of(&mut t, "it")).collect();
    let list = t.b.list(calls);
    let root = t.b.block([bind, list]);

    assert_eq!(
        t.run(root).value(),
        &Value::list(vec![
            Value::Int(1),
            Value::Int(2),
            Value::IteratorEnd,
            Value::IteratorEnd,
        ])
    );
}

#[test]
fn for_loop_drains_generator() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[10, 20]);
    let x = t.b.ident("x");
    let body = t.print(x);
    let root = t.b.for_("x", it, body);
    assert_eq!(t.run(root).lines, vec!["10", "20"]);
}

#[test]
fn yield_inside_loop_keeps_loop_state() {
    // Iterator { gen => i := 0; while i < 3 { gen.yield(i * i); i += 1 } }
    let mut t = TestProgram::new();
    let zero = t.b.int(0);
    let decl = t.b.declare("i", zero);
    let i = t.b.ident("i");
    let three = t.b.int(3);
    let cond = t.b.binary(BinaryOp::Lt, i, three);
    let i1 = t.b.ident("i");
    let i2 = t.b.ident("i");
    let square = t.b.binary(BinaryOp::Mul, i1, i2);
    let gen = t.b.ident("gen");
    let emit = t.b.method(gen, "yield", [square]);
    let one = t.b.int(1);
    let inc = t.b.compound_assign("i", BinaryOp::Add, one);
    let body = t.b.block([emit, inc]);
    let while_expr = t.b.while_(cond, body);
    let it = t.b.iterator("gen", [decl, while_expr]);
    let x = t.b.ident("x");
    let show = t.print(x);
    let root = t.b.for_("x", it, show);
    assert_eq!(t.run(root).lines, vec!["0", "1", "4"]);
}

#[test]
fn raised_error_is_replayed_on_later_next() {
    let mut t = TestProgram::new();
    let gen = t.b.ident("gen");
    let one = t.b.int(1);
    let emit = t.b.method(gen, "yield", [one]);
    let bad = t.b.str("bad");
    let raise = t.b.raise(bad);
    let it = t.b.iterator("gen", [emit, raise]);
    let bind = t.b.declare("it", it);
    let mut rescued = || {
        let next = next_of(&mut t, "it");
        let e = t.b.ident("e");
        let binding = t.b.binding_pattern("e");
        let arm = t.b.arm(binding, None, e);
        t.b.rescue(next, &[arm])
    };
    let second = rescued();
    let third = rescued();
    let first = next_of(&mut t, "it");
    let list = t.b.list([first, second, third]);
    let root = t.b.block([bind, list]);

    assert_eq!(
        t.run(root).value(),
        &Value::list(vec![
            Value::Int(1),
            Value::string("bad"),
            Value::string("bad"),
        ])
    );
}

#[test]
fn next_from_own_body_is_reentrant_error() {
    let mut t = TestProgram::new();
    let inner = next_of(&mut t, "it");
    let gen = t.b.ident("gen");
    let emit = t.b.method(gen, "yield", [inner]);
    let it = t.b.iterator("gen", [emit]);
    let bind = t.b.declare("it", it);
    let next = next_of(&mut t, "it");
    let root = t.b.block([bind, next]);
    assert_eq!(t.run(root).error().kind, EvalErrorKind::GeneratorReentered);
}

#[test]
fn controller_is_useless_outside_its_body() {
    let mut t = TestProgram::new();
    let nil = t.b.nil();
    let holder = t.b.declare("holder", nil);
    let gen = t.b.ident("gen");
    let leak = t.b.assign("holder", gen);
    let gen = t.b.ident("gen");
    let one = t.b.int(1);
    let emit = t.b.method(gen, "yield", [one]);
    let it = t.b.iterator("gen", [leak, emit]);
    let bind = t.b.declare("it", it);
    let next = next_of(&mut t, "it");
    let leaked = t.b.ident("holder");
    let five = t.b.int(5);
    let misuse = t.b.method(leaked, "yield", [five]);
    let root = t.b.block([holder, bind, next, misuse]);

    assert_eq!(
        t.run(root).error().kind,
        EvalErrorKind::GeneratorControlOutsideBody { method: "yield" }
    );
}

#[test]
fn close_ends_iteration() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[1, 2]);
    let bind = t.b.declare("it", it);
    let first = next_of(&mut t, "it");
    let it_ref = t.b.ident("it");
    let close = t.b.method(it_ref, "close", []);
    let after = next_of(&mut t, "it");
    let root = t.b.block([bind, first, close, after]);
    assert_eq!(t.run(root).value(), &Value::IteratorEnd);
}

#[test]
fn stop_ends_iteration_early() {
    let mut t = TestProgram::new();
    let gen = t.b.ident("gen");
    let one = t.b.int(1);
    let first = t.b.method(gen, "yield", [one]);
    let gen = t.b.ident("gen");
    let stop = t.b.method(gen, "stop", []);
    let gen = t.b.ident("gen");
    let two = t.b.int(2);
    let second = t.b.method(gen, "yield", [two]);
    let it = t.b.iterator("gen", [first, stop, second]);
    let x = t.b.ident("x");
    let show = t.print(x);
    let root = t.b.for_("x", it, show);
    assert_eq!(t.run(root).lines, vec!["1"]);
}

#[test]
fn breaking_out_of_for_closes_the_generator() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[1, 2]);
    let bind = t.b.declare("it", it);
    let it_ref = t.b.ident("it");
    let brk = t.b.break_();
    let for_expr = t.b.for_("x", it_ref, brk);
    let after = next_of(&mut t, "it");
    let root = t.b.block([bind, for_expr, after]);
    assert_eq!(t.run(root).value(), &Value::IteratorEnd);
}

#[test]
fn each_literal_evaluation_is_a_fresh_generator() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[1, 2]);
    let mk = t.b.lambda(&[], it);
    let bind_mk = t.b.declare("mk", mk);
    let make_a = t.b.call_named("mk", []);
    let bind_a = t.b.declare("a", make_a);
    let make_b = t.b.call_named("mk", []);
    let bind_b = t.b.declare("b", make_b);
    let a1 = next_of(&mut t, "a");
    let a2 = next_of(&mut t, "a");
    let b1 = next_of(&mut t, "b");
    let list = t.b.list([a1, a2, b1]);
    let root = t.b.block([bind_mk, bind_a, bind_b, list]);

    assert_eq!(
        t.run(root).value(),
        &Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(1)])
    );
}

#[test]
fn generator_consumed_inside_a_task() {
    let mut t = TestProgram::new();
    let it = yielding(&mut t, &[3, 4]);
    let x = t.b.ident("x");
    let show = t.print(x);
    let pause = t.proc_yield();
    let body = t.b.block([show, pause]);
    let for_expr = t.b.for_("x", it, body);
    let future = t.b.spawn(for_expr);
    let bind = t.b.declare("f", future);
    let f = t.b.ident("f");
    let value = t.b.field(f, "value");
    let root = t.b.block([bind, value]);
    assert_eq!(t.run(root).lines, vec!["3", "4"]);
}

#[test]
fn finished_operands_are_not_repeated_after_yield() {
    // Iterator { gen => [print("once"), gen.yield(1), gen.yield(2)] }
    let mut t = TestProgram::new();
    let effect = t.print_str("once");
    let gen = t.b.ident("gen");
    let one = t.b.int(1);
    let first = t.b.method(gen, "yield", [one]);
    let gen = t.b.ident("gen");
    let two = t.b.int(2);
    let second = t.b.method(gen, "yield", [two]);
    let stmt = t.b.list([effect, first, second]);
    let it = t.b.iterator("gen", [stmt]);
    let bind = t.b.declare("it", it);
    let calls: Vec<_> = (0..3).map(|_| next_of(&mut t, "it")).collect();
    let list = t.b.list(calls);
    let root = t.b.block([bind, list]);

    let run = t.run(root);
    assert_eq!(
        run.value(),
        &Value::list(vec![Value::Int(1), Value::Int(2), Value::IteratorEnd])
    );
    assert_eq!(run.lines, vec!["once"]);
}

#[test]
fn generator_body_does_not_see_caller_breakpoints() {
    // breakpoint 'x { it := Iterator { gen => break 'x 1 }; it.next() }
    let mut t = TestProgram::new();
    let one = t.b.int(1);
    let brk = t.b.break_label("x", Some(one));
    let it = t.b.iterator("gen", [brk]);
    let bind = t.b.declare("it", it);
    let next = next_of(&mut t, "it");
    let body = t.b.block([bind, next]);
    let root = t.b.breakpoint("x", body);

    assert_eq!(t.run(root).error().message, "Unknown break label 'x'");
}
