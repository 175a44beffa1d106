//! Host builtins available to every build file.
//!
//! All builtins share the evaluator's calling convention: they receive the
//! calling [`Thread`], their own [`Builtin`] and the call's [`Arguments`],
//! and return a value or an error that aborts the calling file. Builtins
//! that touch the build graph find their package through the context
//! slots (see [`crate::context`]).
//!
//! [`Thread`]: sky_eval::Thread
//! [`Builtin`]: sky_eval::Builtin
//! [`Arguments`]: sky_eval::Arguments

mod diagnostics;
mod files;
mod rules;

use sky_eval::errors::host_error;
use sky_eval::{ArgValue, EvalError, GlobalsBuilder, NativeFn, Value};
use sky_graph::Configuration;

use crate::config::make_config;

/// Builtins installed as top-level functions.
const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("build_rule", rules::build_rule),
    ("package", rules::package),
    ("package_name", rules::package_name),
    ("get_labels", rules::get_labels),
    ("get_command", rules::get_command),
    ("set_command", rules::set_command),
    ("add_out", rules::add_out),
    ("add_licence", rules::add_licence),
    ("add_dep", rules::add_dep),
    ("add_exported_dep", rules::add_exported_dep),
    ("subinclude", files::subinclude),
    ("glob", files::glob),
    ("fail", diagnostics::fail),
];

/// Members of the `log` namespace; the severity is the member name.
const LOG_FUNCTIONS: &[(&str, NativeFn)] = &[
    ("debug", diagnostics::log),
    ("info", diagnostics::log),
    ("notice", diagnostics::log),
    ("warning", diagnostics::log),
    ("error", diagnostics::log),
    ("fatal", diagnostics::log),
];

/// Install `CONFIG` and the host builtins into `globals`.
///
/// Called once during startup, before any rule definitions load.
pub fn register_builtins(globals: &mut GlobalsBuilder, config: &Configuration) {
    globals.set("CONFIG", make_config(config));
    for (name, func) in FUNCTIONS {
        globals.set_builtin(name, *func);
    }
    globals.set_namespace("log", LOG_FUNCTIONS);
    tracing::debug!(count = FUNCTIONS.len() + 1, "registered host builtins");
}

// === Argument helpers ===

/// An argument that was omitted or passed as `None`.
fn unset(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_none())
}

fn string_arg(value: Option<Value>, context: &str) -> Result<String, EvalError> {
    unset(value).map_or(Ok(String::new()), |v| v.into_string(context))
}

fn strings_arg(value: Option<Value>, context: &str) -> Result<Vec<String>, EvalError> {
    unset(value).map_or(Ok(Vec::new()), |v| v.into_string_list(context))
}

fn bool_arg(value: Option<Value>, context: &str) -> Result<bool, EvalError> {
    unset(value).map_or(Ok(false), |v| v.into_bool(context))
}

/// A required argument; `bind` has already checked presence.
fn required(value: Option<Value>, context: &str) -> Result<String, EvalError> {
    value.unwrap_or(Value::None).into_string(context)
}

fn graph_error(err: impl std::fmt::Display) -> EvalError {
    host_error(err.to_string())
}

#[cfg(test)]
mod tests;
