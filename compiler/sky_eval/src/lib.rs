//! Evaluator for build description files.
//!
//! The entry point is [`exec_file`]: parse a file and execute it against a
//! frozen [`Globals`] snapshot on a [`Thread`], returning the file's
//! top-level [`Bindings`]. Host code extends the language by installing
//! [`Builtin`]s in a [`GlobalsBuilder`] and passes per-evaluation state to
//! them through the thread's context-local slots.

mod args;
mod builtins;
pub mod errors;
mod eval;
mod globals;
pub mod log_sink;
mod module;
mod thread;
mod value;

pub use args::{ArgValue, Arguments};
pub use errors::{EvalError, EvalErrorKind};
pub use eval::call;
pub use globals::{Globals, GlobalsBuilder};
pub use log_sink::{Severity, SharedLogSink};
pub use module::{exec_file, Bindings, ModuleScope};
pub use thread::{Loader, Thread};
pub use value::{
    percent_format, BoundMethod, Builtin, Dict, Function, HashKey, List, MethodFn, NativeFn, Struct,
    Value,
};

#[cfg(test)]
mod test_helpers;
