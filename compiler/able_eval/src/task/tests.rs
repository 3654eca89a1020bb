use super::*;
use able_ir::SharedInterner;
use pretty_assertions::assert_eq;

fn handle(kind: TaskKind) -> TaskHandle {
    TaskHandle::new(1, kind, ExprId::new(0), Environment::new())
}

fn names(interner: &StringInterner) -> ProcErrorNames {
    ProcErrorNames {
        proc_error: interner.intern("ProcError"),
        details: interner.intern("details"),
    }
}

mod status_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_task_is_pending_without_flags() {
        let task = handle(TaskKind::Proc);
        assert!(task.is_pending());
        assert_eq!(task.flags(), TaskFlags::empty());
        assert_eq!(task.status().label(), "Pending");
    }

    #[test]
    fn settling_terminal_releases_runner_and_frames() {
        let task = handle(TaskKind::Future);
        let job: Job = Rc::new(|_: &mut Interpreter| {});
        task.set_runner(job);
        task.set_flag(TaskFlags::QUEUED, true);
        task.frames().borrow_mut().set_resuming_call(true);

        task.settle(TaskStatus::Resolved(Value::Int(3)));

        assert!(task.runner().is_none());
        assert!(!task.has_flag(TaskFlags::QUEUED));
        assert!(!task.frames().borrow().is_resuming_call());
        assert_eq!(task.status(), TaskStatus::Resolved(Value::Int(3)));
    }

    #[test]
    fn settling_pending_keeps_runner() {
        let task = handle(TaskKind::Proc);
        let job: Job = Rc::new(|_: &mut Interpreter| {});
        task.set_runner(job);
        task.settle(TaskStatus::Pending);
        assert!(task.runner().is_some());
    }
}

mod proc_error_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raised_proc_error_struct_keeps_details() {
        let interner = SharedInterner::new();
        let names = names(&interner);
        let raised = ProcError::new("boom").to_value(names);
        assert_eq!(
            ProcError::from_raised(&raised, names, &interner),
            ProcError::new("boom")
        );
    }

    #[test]
    fn raised_error_value_uses_message() {
        let interner = SharedInterner::new();
        let raised = Value::error("bad input", None);
        assert_eq!(
            ProcError::from_raised(&raised, names(&interner), &interner).details,
            "bad input"
        );
    }

    #[test]
    fn raised_plain_value_uses_display() {
        let interner = SharedInterner::new();
        let raised = Value::string("oops");
        assert_eq!(
            ProcError::from_raised(&raised, names(&interner), &interner).details,
            "oops"
        );
    }
}

#[test]
fn kind_display_matches_message_prefix() {
    assert_eq!(TaskKind::Proc.to_string(), "Proc");
    assert_eq!(TaskKind::Future.to_string(), "Future");
}

#[test]
fn handles_compare_by_identity() {
    let a = handle(TaskKind::Proc);
    let b = handle(TaskKind::Proc);
    assert!(a.ptr_eq(&a.clone()));
    assert!(!a.ptr_eq(&b));
}
