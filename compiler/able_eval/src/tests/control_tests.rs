//! Control flow, on the plain path and resumed inside tasks.

use able_ir::{AstBuilder, BinaryOp, BindingPattern, MatchPattern};

use super::test_helpers::{Run, TestProgram};
use crate::{EvalErrorKind, Value};

/// `{ stmts...; p := proc body; p.value }`
fn run_in_proc(t: &mut TestProgram, body: able_ir::ExprId) -> able_ir::ExprId {
    let proc_expr = t.b.proc_(body);
    let bind = t.b.declare("p", proc_expr);
    let p = t.b.ident("p");
    let value = t.b.field(p, "value");
    t.b.block([bind, value])
}

mod plain_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_block_is_void() {
        let mut t = TestProgram::new();
        let root = t.b.block([]);
        assert_eq!(t.run(root).value(), &Value::Void);
    }

    #[test]
    fn if_picks_first_matching_or_clause() {
        let mut t = TestProgram::new();
        let five = t.b.int(5);
        let decl = t.b.declare("x", five);
        let x1 = t.b.ident("x");
        let three = t.b.int(3);
        let small_cond = t.b.binary(BinaryOp::Lt, x1, three);
        let small = t.b.str("small");
        let x2 = t.b.ident("x");
        let ten = t.b.int(10);
        let medium_cond = t.b.binary(BinaryOp::Lt, x2, ten);
        let medium = t.b.str("medium");
        let large = t.b.str("large");
        let if_expr = t.b.if_(
            small_cond,
            small,
            &[
                AstBuilder::or_clause(medium_cond, medium),
                AstBuilder::else_clause(large),
            ],
        );
        let root = t.b.block([decl, if_expr]);
        assert_eq!(t.run(root).value(), &Value::string("medium"));
    }

    #[test]
    fn if_without_match_is_nil() {
        let mut t = TestProgram::new();
        let cond = t.b.bool(false);
        let then = t.b.int(1);
        let root = t.b.if_(cond, then, &[]);
        assert_eq!(t.run(root).value(), &Value::Nil);
    }

    #[test]
    fn while_returns_last_body_value() {
        let mut t = TestProgram::new();
        let zero = t.b.int(0);
        let decl = t.b.declare("i", zero);
        let i = t.b.ident("i");
        let four = t.b.int(4);
        let cond = t.b.binary(BinaryOp::Lt, i, four);
        let one = t.b.int(1);
        let inc = t.b.compound_assign("i", BinaryOp::Add, one);
        let i2 = t.b.ident("i");
        let two = t.b.int(2);
        let doubled = t.b.binary(BinaryOp::Mul, i2, two);
        let body = t.b.block([inc, doubled]);
        let while_expr = t.b.while_(cond, body);
        let root = t.b.block([decl, while_expr]);
        assert_eq!(t.run(root).value(), &Value::Int(8));
    }

    #[test]
    fn while_that_never_runs_is_nil() {
        let mut t = TestProgram::new();
        let cond = t.b.bool(false);
        let body = t.b.int(1);
        let root = t.b.while_(cond, body);
        assert_eq!(t.run(root).value(), &Value::Nil);
    }

    #[test]
    fn break_value_leaves_loop() {
        let mut t = TestProgram::new();
        let zero = t.b.int(0);
        let decl = t.b.declare("i", zero);
        let one = t.b.int(1);
        let inc = t.b.compound_assign("i", BinaryOp::Add, one);
        let i = t.b.ident("i");
        let three = t.b.int(3);
        let at_three = t.b.binary(BinaryOp::Eq, i, three);
        let i2 = t.b.ident("i");
        let ten = t.b.int(10);
        let result = t.b.binary(BinaryOp::Mul, i2, ten);
        let brk = t.b.break_with(result);
        let check = t.b.if_(at_three, brk, &[]);
        let body = t.b.block([inc, check]);
        let loop_expr = t.b.loop_(body);
        let root = t.b.block([decl, loop_expr]);
        assert_eq!(t.run(root).value(), &Value::Int(30));
    }

    #[test]
    fn for_over_range_skips_on_continue() {
        let mut t = TestProgram::new();
        let zero = t.b.int(0);
        let four = t.b.int(4);
        let range = t.b.range(zero, four, false);
        let x = t.b.ident("x");
        let two = t.b.int(2);
        let is_two = t.b.binary(BinaryOp::Eq, x, two);
        let cont = t.b.continue_();
        let skip = t.b.if_(is_two, cont, &[]);
        let x2 = t.b.ident("x");
        let show = t.print(x2);
        let body = t.b.block([skip, show]);
        let root = t.b.for_("x", range, body);
        let run = t.run(root);
        assert_eq!(run.lines, vec!["0", "1", "3"]);
    }

    #[test]
    fn for_destructures_each_element() {
        let mut t = TestProgram::new();
        let pairs: Vec<_> = [(1, 2), (3, 4)]
            .into_iter()
            .map(|(a, b)| {
                let a = t.b.int(a);
                let b = t.b.int(b);
                t.b.list([a, b])
            })
            .collect();
        let list = t.b.list(pairs);
        let pattern = BindingPattern::List {
            elements: vec![
                BindingPattern::Name(t.b.name("a")),
                BindingPattern::Name(t.b.name("b")),
            ],
            rest: None,
        };
        let a = t.b.ident("a");
        let b = t.b.ident("b");
        let sum = t.b.binary(BinaryOp::Add, a, b);
        let body = t.print(sum);
        let root = t.b.for_pattern(pattern, list, body);
        assert_eq!(t.run(root).lines, vec!["3", "7"]);
    }

    #[test]
    fn for_uses_registered_iterator_method() {
        let mut t = TestProgram::new();
        let gen = t.b.ident("gen");
        let receiver = t.b.ident("self");
        let n = t.b.field(receiver, "n");
        let emit = t.b.method(gen, "yield", [n]);
        let it = t.b.iterator("gen", [emit]);
        let method = t.b.lambda(&["self"], it);
        let seven = t.b.int(7);
        let counter = t.b.struct_lit("Counter", &[("n", seven)]);
        let x = t.b.ident("x");
        let show = t.print(x);
        let root = t.b.for_("x", counter, show);

        let (mut interp, output) = t.build();
        let Ok(callable) = interp.run(method) else {
            panic!("lambda literal failed to evaluate");
        };
        interp.register_method("Counter", "iterator", callable);
        assert_eq!(interp.run(root), Ok(Value::Void));
        assert_eq!(output.lines(), vec!["7"]);
    }

    #[test]
    fn labeled_break_exits_enclosing_breakpoint() {
        let mut t = TestProgram::new();
        let xs: Vec<_> = (1..=3).map(|n| t.b.int(n)).collect();
        let outer_list = t.b.list(xs);
        let ys: Vec<_> = [10, 20].into_iter().map(|n| t.b.int(n)).collect();
        let inner_list = t.b.list(ys);
        let y = t.b.ident("y");
        let twenty = t.b.int(20);
        let is_twenty = t.b.binary(BinaryOp::Eq, y, twenty);
        let x = t.b.ident("x");
        let brk = t.b.break_label("outer", Some(x));
        let check = t.b.if_(is_twenty, brk, &[]);
        let y2 = t.b.ident("y");
        let show = t.print(y2);
        let inner_body = t.b.block([check, show]);
        let inner = t.b.for_("y", inner_list, inner_body);
        let outer = t.b.for_("x", outer_list, inner);
        let zero = t.b.int(0);
        let labeled_body = t.b.block([outer, zero]);
        let root = t.b.breakpoint("outer", labeled_body);
        let run = t.run(root);
        assert_eq!(run.value(), &Value::Int(1));
        assert_eq!(run.lines, vec!["10"]);
    }

    #[test]
    fn unknown_break_label_is_an_error() {
        let mut t = TestProgram::new();
        let one = t.b.int(1);
        let list = t.b.list([one]);
        let brk = t.b.break_label("nowhere", None);
        let root = t.b.for_("x", list, brk);
        let run = t.run(root);
        assert_eq!(run.error().message, "Unknown break label 'nowhere'");
    }

    #[test]
    fn labeled_continue_is_rejected() {
        let mut t = TestProgram::new();
        let one = t.b.int(1);
        let list = t.b.list([one]);
        let cont = t.b.continue_label("outer");
        let root = t.b.for_("x", list, cont);
        let run = t.run(root);
        assert_eq!(run.error().kind, EvalErrorKind::LabeledContinue);
    }

    #[test]
    fn break_inside_function_body_is_an_error() {
        let mut t = TestProgram::new();
        let brk = t.b.break_();
        let lambda = t.b.lambda(&[], brk);
        let decl = t.b.declare("f", lambda);
        let call = t.b.call_named("f", []);
        let root = t.b.block([decl, call]);
        let run = t.run(root);
        assert_eq!(run.error().message, "break outside of loop");
    }

    #[test]
    fn match_uses_guard_then_falls_through() {
        let mut t = TestProgram::new();
        let subject = t.b.int(7);
        let one = t.b.int(1);
        let one_body = t.b.str("one");
        let one_arm = t.b.arm(MatchPattern::Literal(one), None, one_body);
        let n = t.b.ident("n");
        let five = t.b.int(5);
        let guard = t.b.binary(BinaryOp::Gt, n, five);
        let big = t.b.str("big");
        let binding = t.b.binding_pattern("n");
        let big_arm = t.b.arm(binding, Some(guard), big);
        let other = t.b.str("other");
        let other_arm = t.b.arm(MatchPattern::Wildcard, None, other);
        let root = t.b.match_(subject, &[one_arm, big_arm, other_arm]);
        assert_eq!(t.run(root).value(), &Value::string("big"));
    }

    #[test]
    fn match_without_matching_arm_fails() {
        let mut t = TestProgram::new();
        let subject = t.b.int(3);
        let one = t.b.int(1);
        let body = t.b.str("one");
        let arm = t.b.arm(MatchPattern::Literal(one), None, body);
        let root = t.b.match_(subject, &[arm]);
        assert_eq!(t.run(root).error().kind, EvalErrorKind::NonExhaustiveMatch);
    }

    #[test]
    fn rescue_binds_raised_value() {
        let mut t = TestProgram::new();
        let bad = t.b.str("bad");
        let raise = t.b.raise(bad);
        let msg = t.b.ident("msg");
        let binding = t.b.binding_pattern("msg");
        let arm = t.b.arm(binding, None, msg);
        let root = t.b.rescue(raise, &[arm]);
        assert_eq!(t.run(root).value(), &Value::string("bad"));
    }

    #[test]
    fn rescue_without_matching_arm_reraises() {
        let mut t = TestProgram::new();
        let five = t.b.int(5);
        let raise = t.b.raise(five);
        let one = t.b.int(1);
        let body = t.b.str("one");
        let arm = t.b.arm(MatchPattern::Literal(one), None, body);
        let root = t.b.rescue(raise, &[arm]);
        assert_eq!(t.run(root).error().message, "uncaught error: 5");
    }

    #[test]
    fn ensure_runs_cleanup_when_body_raises() {
        let mut t = TestProgram::new();
        let boom = t.b.str("boom");
        let raise = t.b.raise(boom);
        let cleanup = t.print_str("cleanup");
        let guarded = t.b.ensure(raise, cleanup);
        let e = t.b.ident("e");
        let binding = t.b.binding_pattern("e");
        let arm = t.b.arm(binding, None, e);
        let root = t.b.rescue(guarded, &[arm]);
        let run = t.run(root);
        assert_eq!(run.value(), &Value::string("boom"));
        assert_eq!(run.lines, vec!["cleanup"]);
    }
}

mod resumed_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn while_loop_resumes_after_each_yield() {
        let mut t = TestProgram::new();
        let zero = t.b.int(0);
        let decl = t.b.declare("i", zero);
        let i = t.b.ident("i");
        let three = t.b.int(3);
        let cond = t.b.binary(BinaryOp::Lt, i, three);
        let i2 = t.b.ident("i");
        let show = t.print(i2);
        let one = t.b.int(1);
        let inc = t.b.compound_assign("i", BinaryOp::Add, one);
        let pause = t.proc_yield();
        let body = t.b.block([show, inc, pause]);
        let while_expr = t.b.while_(cond, body);
        let i3 = t.b.ident("i");
        let task_body = t.b.block([decl, while_expr, i3]);
        let root = run_in_proc(&mut t, task_body);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::Int(3));
        assert_eq!(run.lines, vec!["0", "1", "2"]);
    }

    #[test]
    fn if_condition_resumes_without_repeating_side_effects() {
        let mut t = TestProgram::new();
        let show = t.print_str("cond");
        let pause = t.proc_yield();
        let yes = t.b.bool(true);
        let cond = t.b.block([show, pause, yes]);
        let then = t.b.str("then");
        let otherwise = t.b.str("else");
        let if_expr = t.b.if_(cond, then, &[AstBuilder::else_clause(otherwise)]);
        let root = run_in_proc(&mut t, if_expr);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::string("then"));
        assert_eq!(run.lines, vec!["cond"]);
    }

    #[test]
    fn match_arm_body_resumes_with_its_bindings() {
        let mut t = TestProgram::new();
        let subject = t.b.int(2);
        let one = t.b.int(1);
        let one_body = t.b.str("one");
        let one_arm = t.b.arm(MatchPattern::Literal(one), None, one_body);
        let show = t.print_str("arm");
        let pause = t.proc_yield();
        let n = t.b.ident("n");
        let ten = t.b.int(10);
        let scaled = t.b.binary(BinaryOp::Mul, n, ten);
        let body = t.b.block([show, pause, scaled]);
        let binding = t.b.binding_pattern("n");
        let n_arm = t.b.arm(binding, None, body);
        let match_expr = t.b.match_(subject, &[one_arm, n_arm]);
        let root = run_in_proc(&mut t, match_expr);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::Int(20));
        assert_eq!(run.lines, vec!["arm"]);
    }

    #[test]
    fn for_loop_visits_each_element_once_across_yields() {
        let mut t = TestProgram::new();
        let items: Vec<_> = (1..=3).map(|n| t.b.int(n)).collect();
        let list = t.b.list(items);
        let x = t.b.ident("x");
        let show = t.print(x);
        let pause = t.proc_yield();
        let body = t.b.block([show, pause]);
        let for_expr = t.b.for_("x", list, body);
        let done = t.b.str("done");
        let task_body = t.b.block([for_expr, done]);
        let root = run_in_proc(&mut t, task_body);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::string("done"));
        assert_eq!(run.lines, vec!["1", "2", "3"]);
    }

    /// Loop over a `Src` struct whose `next` counts the global `i` up to 2
    /// and whose `close` counts calls in the global `closed`. The body
    /// yields after printing each item and ends with `tail`.
    fn run_counting_source(tail: fn(&mut TestProgram) -> Option<able_ir::ExprId>) -> Run {
        let mut t = TestProgram::new();
        let i = t.b.ident("i");
        let two = t.b.int(2);
        let more = t.b.binary(BinaryOp::Lt, i, two);
        let one = t.b.int(1);
        let step = t.b.compound_assign("i", BinaryOp::Add, one);
        let stop = t.b.ident("stop");
        let next_body = t.b.if_(more, step, &[AstBuilder::else_clause(stop)]);
        let next = t.b.lambda(&["self"], next_body);
        let one = t.b.int(1);
        let close_body = t.b.compound_assign("closed", BinaryOp::Add, one);
        let close = t.b.lambda(&["self"], close_body);

        let source = t.b.struct_lit("Src", &[]);
        let x = t.b.ident("x");
        let show = t.print(x);
        let pause = t.proc_yield();
        let mut stmts = vec![show, pause];
        stmts.extend(tail(&mut t));
        let body = t.b.block(stmts);
        let for_expr = t.b.for_("x", source, body);
        let closed = t.b.ident("closed");
        let task_body = t.b.block([for_expr, closed]);
        let root = run_in_proc(&mut t, task_body);

        let (mut interp, output) = t.build();
        interp.define_global("i", Value::Int(0));
        interp.define_global("closed", Value::Int(0));
        interp.define_global("stop", Value::IteratorEnd);
        for (name, method) in [("next", next), ("close", close)] {
            let Ok(callable) = interp.run(method) else {
                panic!("lambda literal for {name} failed to evaluate");
            };
            interp.register_method("Src", name, callable);
        }
        let result = interp.run(root);
        Run {
            result,
            lines: output.lines(),
            interp,
        }
    }

    #[test]
    fn suspended_for_closes_its_source_once_when_exhausted() {
        let run = run_counting_source(|_| None);
        assert_eq!(run.value(), &Value::Int(1));
        assert_eq!(run.lines, vec!["1", "2"]);
    }

    #[test]
    fn suspended_for_closes_its_source_once_on_break() {
        let run = run_counting_source(|t| Some(t.b.break_()));
        assert_eq!(run.value(), &Value::Int(1));
        assert_eq!(run.lines, vec!["1"]);
    }

    #[test]
    fn ensure_cleanup_is_not_run_on_suspension() {
        let mut t = TestProgram::new();
        let show = t.print_str("body");
        let pause = t.proc_yield();
        let one = t.b.int(1);
        let body = t.b.block([show, pause, one]);
        let cleanup = t.print_str("cleanup");
        let ensure = t.b.ensure(body, cleanup);
        let root = run_in_proc(&mut t, ensure);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::Int(1));
        assert_eq!(run.lines, vec!["body", "cleanup"]);
    }

    #[test]
    fn rescue_handler_resumes_with_raised_value() {
        let mut t = TestProgram::new();
        let err = t.b.str("e");
        let raise = t.b.raise(err);
        let pause = t.proc_yield();
        let e = t.b.ident("e");
        let handler = t.b.block([pause, e]);
        let binding = t.b.binding_pattern("e");
        let arm = t.b.arm(binding, None, handler);
        let rescue = t.b.rescue(raise, &[arm]);
        let root = run_in_proc(&mut t, rescue);

        assert_eq!(t.run(root).value(), &Value::string("e"));
    }

    #[test]
    fn same_function_body_keeps_separate_progress_per_task() {
        // f(tag) { i := 0; while i < 2 { print(tag * 10 + i); i += 1; proc_yield() }; i }
        let mut t = TestProgram::new();
        let zero = t.b.int(0);
        let decl = t.b.declare("i", zero);
        let i = t.b.ident("i");
        let two = t.b.int(2);
        let cond = t.b.binary(BinaryOp::Lt, i, two);
        let tag = t.b.ident("tag");
        let ten = t.b.int(10);
        let scaled = t.b.binary(BinaryOp::Mul, tag, ten);
        let i2 = t.b.ident("i");
        let code = t.b.binary(BinaryOp::Add, scaled, i2);
        let show = t.print(code);
        let one = t.b.int(1);
        let inc = t.b.compound_assign("i", BinaryOp::Add, one);
        let pause = t.proc_yield();
        let loop_body = t.b.block([show, inc, pause]);
        let while_expr = t.b.while_(cond, loop_body);
        let i3 = t.b.ident("i");
        let f_body = t.b.block([decl, while_expr, i3]);
        let f = t.b.lambda(&["tag"], f_body);
        let def = t.b.declare("f", f);

        let one = t.b.int(1);
        let call_a = t.b.call_named("f", [one]);
        let spawn_a = t.b.spawn(call_a);
        let bind_a = t.b.declare("a", spawn_a);
        let two = t.b.int(2);
        let call_b = t.b.call_named("f", [two]);
        let spawn_b = t.b.spawn(call_b);
        let bind_b = t.b.declare("b", spawn_b);
        let a = t.b.ident("a");
        let a_value = t.b.field(a, "value");
        let b = t.b.ident("b");
        let b_value = t.b.field(b, "value");
        let total = t.b.binary(BinaryOp::Add, a_value, b_value);
        let root = t.b.block([def, bind_a, bind_b, total]);

        let run = t.run(root);
        assert_eq!(run.value(), &Value::Int(4));
        assert_eq!(run.lines, vec!["10", "20", "11", "21"]);
    }

    #[test]
    fn settled_task_leaves_no_saved_frames() {
        let mut t = TestProgram::new();
        let pause = t.proc_yield();
        let one = t.b.int(1);
        let body = t.b.block([pause, one]);
        let proc_expr = t.b.proc_(body);
        let bind = t.b.declare("p", proc_expr);
        let p = t.b.ident("p");
        let value = t.b.field(p, "value");
        let p2 = t.b.ident("p");
        let root = t.b.block([bind, value, p2]);

        let run = t.run(root);
        let Value::Proc(task) = run.value() else {
            panic!("expected a proc handle, got {:?}", run.value());
        };
        assert!(task.frames().borrow().is_empty());
    }
}
