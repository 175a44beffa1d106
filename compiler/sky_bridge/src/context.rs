//! Per-evaluation state carried by an execution context.
//!
//! Builtins are plain functions; the package being parsed and the shared
//! build state reach them through two context-local slots on the
//! [`Thread`]. Both are written by [`bind`] before a build file runs.

use std::sync::Arc;

use sky_eval::errors::invariant;
use sky_eval::{EvalError, Thread};
use sky_graph::{BuildState, Package};

const PACKAGE_SLOT: &str = "sky.package";
const STATE_SLOT: &str = "sky.build_state";

/// Point `thread` at `package` and `state`, replacing any earlier binding.
pub fn bind(thread: &mut Thread, package: Arc<Package>, state: Arc<BuildState>) {
    tracing::trace!(thread = thread.name(), package = package.name(), "binding context");
    thread.set_local(PACKAGE_SLOT, package);
    thread.set_local(STATE_SLOT, state);
}

/// Remove both bindings.
pub fn unbind(thread: &mut Thread) {
    thread.clear_local(PACKAGE_SLOT);
    thread.clear_local(STATE_SLOT);
}

/// The package bound to `thread`.
pub fn current_package(thread: &Thread) -> Result<Arc<Package>, EvalError> {
    thread
        .local::<Package>(PACKAGE_SLOT)
        .ok_or_else(|| invariant(format!("no package bound to context '{}'", thread.name())))
}

/// The build state bound to `thread`.
pub fn build_state(thread: &Thread) -> Result<Arc<BuildState>, EvalError> {
    thread
        .local::<BuildState>(STATE_SLOT)
        .ok_or_else(|| invariant(format!("no build state bound to context '{}'", thread.name())))
}
