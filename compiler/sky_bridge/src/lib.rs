//! Host side of build-file evaluation.
//!
//! Connects the evaluator to the build graph:
//!
//! - [`make_config`]: the read-only `CONFIG` global
//! - [`register_builtins`]: `build_rule`, `package`, `subinclude`, `glob`,
//!   the rule mutators, `fail` and the `log` namespace
//! - [`RuleDefLoader`]: the embedded rule definitions, loaded in order
//! - [`ContextPool`]: one reusable execution context per parse worker
//! - [`context`]: binding a context to the package it is parsing
//! - [`Parser`]: all of the above, driving a set of packages in parallel
//!
//! # Tracing
//!
//! Enable with `RUST_LOG=sky_bridge=debug` (startup and per-file events) or
//! `RUST_LOG=sky_bridge=trace` (context checkout and binding).

pub mod builtins;
pub mod config;
pub mod context;
mod error;
pub mod loader;
pub mod parser;
pub mod pool;
pub mod subinclude;

use std::sync::Once;

pub use builtins::register_builtins;
pub use config::{host_arch, host_os, make_config, setting_name, CONFIG_STRUCT_NAME};
pub use error::{ParseError, StartupError};
pub use loader::{load_globals, RuleDefLoader, RULE_ASSETS};
pub use parser::{PackageOutcome, Parser};
pub use pool::{BoundContext, Checkout, ContextPool, PoolError};
pub use sky_eval::log_sink::{
    buffer_sink, silent_sink, tracing_sink, LogRecord, Severity, SharedLogSink,
};
pub use subinclude::SubincludeLoader;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
