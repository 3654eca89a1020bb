//! Shared scaffolding for interpreter tests.

use able_ir::{AstBuilder, ExprId, SharedInterner};

use crate::{buffer_handler, EvalError, Interpreter, InterpreterBuilder, SharedPrintHandler, Value};

/// Program under construction plus the knobs of the interpreter that will
/// run it.
pub(crate) struct TestProgram {
    pub(crate) b: AstBuilder,
    max_steps: Option<usize>,
}

/// Outcome of running a `TestProgram`.
pub(crate) struct Run {
    pub(crate) result: Result<Value, EvalError>,
    pub(crate) lines: Vec<String>,
    pub(crate) interp: Interpreter,
}

impl Run {
    pub(crate) fn value(&self) -> &Value {
        match &self.result {
            Ok(value) => value,
            Err(e) => panic!("program failed: {e}"),
        }
    }

    pub(crate) fn error(&self) -> &EvalError {
        match &self.result {
            Ok(value) => panic!("expected an error, got {value:?}"),
            Err(e) => e,
        }
    }

    pub(crate) fn display(&self) -> String {
        self.interp.display(self.value())
    }
}

impl TestProgram {
    pub(crate) fn new() -> Self {
        TestProgram {
            b: AstBuilder::new(SharedInterner::new()),
            max_steps: None,
        }
    }

    pub(crate) fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// `print(value)`
    pub(crate) fn print(&mut self, value: ExprId) -> ExprId {
        self.b.call_named("print", [value])
    }

    pub(crate) fn print_str(&mut self, text: &str) -> ExprId {
        let text = self.b.str(text);
        self.print(text)
    }

    pub(crate) fn proc_yield(&mut self) -> ExprId {
        self.b.call_named("proc_yield", [])
    }

    /// `name(args)` for a builtin taking handles.
    pub(crate) fn builtin(&mut self, name: &str, args: &[ExprId]) -> ExprId {
        self.b.call_named(name, args.iter().copied())
    }

    pub(crate) fn build(self) -> (Interpreter, SharedPrintHandler) {
        let output = buffer_handler();
        let interner = self.b.interner().clone();
        let arena = self.b.finish();
        let mut builder = InterpreterBuilder::new(interner, arena).print_handler(output.clone());
        if let Some(max_steps) = self.max_steps {
            builder = builder.scheduler_max_steps(max_steps);
        }
        (builder.build(), output)
    }

    pub(crate) fn run(self, root: ExprId) -> Run {
        let (mut interp, output) = self.build();
        let result = interp.run(root);
        Run {
            result,
            lines: output.lines(),
            interp,
        }
    }
}
