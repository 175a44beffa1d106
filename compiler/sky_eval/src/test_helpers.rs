//! Helpers for running snippets in unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::log_sink::buffer_sink;
use crate::{exec_file, Bindings, EvalError, GlobalsBuilder, SharedLogSink, Thread, Value};

/// Run `source` against the universe builtins.
pub(crate) fn run(source: &str) -> Result<Bindings, EvalError> {
    let globals = GlobalsBuilder::standard().freeze();
    let mut thread = Thread::new("test");
    exec_file(&mut thread, "test.sky", source, &globals)
}

/// Run `source` with a capturing log sink; return the bindings and the sink.
pub(crate) fn run_logged(source: &str) -> (Result<Bindings, EvalError>, SharedLogSink) {
    let globals = GlobalsBuilder::standard().freeze();
    let sink = buffer_sink();
    let mut thread = Thread::new("test");
    thread.set_log_sink(sink.clone());
    (exec_file(&mut thread, "test.sky", source, &globals), sink)
}

/// Evaluate a single expression.
pub(crate) fn eval(expr: &str) -> Value {
    let bindings = run(&format!("result = {expr}\n"))
        .unwrap_or_else(|e| panic!("evaluating `{expr}` failed: {e}"));
    bindings.get("result").cloned().expect("result binding")
}

/// Evaluate a single expression that must fail; return the message.
pub(crate) fn eval_err(expr: &str) -> String {
    match run(&format!("result = {expr}\n")) {
        Ok(b) => panic!("expected `{expr}` to fail, got {:?}", b.get("result")),
        Err(e) => e.message(),
    }
}
