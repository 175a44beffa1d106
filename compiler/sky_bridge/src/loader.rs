//! Rule definitions written in the build language itself.
//!
//! The assets are evaluated in a fixed order against one growing global
//! namespace. Each asset runs against a snapshot of the globals taken when
//! it starts, so its functions can use everything loaded before it but
//! nothing loaded after: a helper defined in a later asset is an undefined
//! name when the function is first called. Keep [`RULE_ASSETS`] in
//! dependency order.

use std::fs;
use std::path::Path;

use sky_eval::{exec_file, Globals, GlobalsBuilder, SharedLogSink, Thread};
use sky_graph::Configuration;

use crate::builtins::register_builtins;
use crate::StartupError;

/// Embedded rule-definition files, in load order.
pub const RULE_ASSETS: &[(&str, &str)] = &[
    ("builtins.build_defs", include_str!("../rules/builtins.build_defs")),
    ("misc_rules.build_defs", include_str!("../rules/misc_rules.build_defs")),
    ("sh_rules.build_defs", include_str!("../rules/sh_rules.build_defs")),
    ("python_rules.build_defs", include_str!("../rules/python_rules.build_defs")),
];

/// Builds the global namespace during startup.
pub struct RuleDefLoader {
    globals: GlobalsBuilder,
    thread: Thread,
    loaded: Vec<String>,
}

impl RuleDefLoader {
    pub fn new(globals: GlobalsBuilder, log: SharedLogSink) -> Self {
        let mut thread = Thread::new("startup");
        thread.set_log_sink(log);
        RuleDefLoader {
            globals,
            thread,
            loaded: Vec::new(),
        }
    }

    /// Execute one file and merge its top-level names into the globals.
    #[tracing::instrument(level = "debug", skip(self, source))]
    pub fn load_source(&mut self, name: &str, source: &str) -> Result<(), StartupError> {
        let snapshot = self.globals.snapshot();
        let bindings =
            exec_file(&mut self.thread, name, source, &snapshot).map_err(|source| {
                StartupError::Asset {
                    asset: name.to_string(),
                    source,
                }
            })?;
        tracing::debug!(defined = bindings.len(), "loaded rule definitions");
        self.globals.extend(&bindings);
        self.loaded.push(name.to_string());
        Ok(())
    }

    /// Load [`RULE_ASSETS`] in order.
    pub fn load_assets(&mut self) -> Result<(), StartupError> {
        for (name, source) in RULE_ASSETS {
            self.load_source(name, source)?;
        }
        Ok(())
    }

    /// Load repository files named in `parse.preload_build_defs`.
    ///
    /// Paths are relative to `repo_root`; a leading `//` is accepted.
    pub fn load_preloads(&mut self, repo_root: &Path, preloads: &[String]) -> Result<(), StartupError> {
        for preload in preloads {
            let path = repo_root.join(preload.trim_start_matches("//"));
            let source = fs::read_to_string(&path)
                .map_err(|source| StartupError::Preload { path, source })?;
            self.load_source(preload, &source)?;
        }
        Ok(())
    }

    /// Names of the files loaded so far, in order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    pub fn finish(self) -> Globals {
        self.globals.freeze()
    }
}

/// The complete global namespace for `config`: universe builtins, host
/// builtins and `CONFIG`, the embedded rule definitions, then preloads.
pub fn load_globals(
    config: &Configuration,
    repo_root: &Path,
    log: SharedLogSink,
) -> Result<Globals, StartupError> {
    let mut globals = GlobalsBuilder::standard();
    register_builtins(&mut globals, config);
    let mut loader = RuleDefLoader::new(globals, log);
    loader.load_assets()?;
    loader.load_preloads(repo_root, &config.parse.preload_build_defs)?;
    Ok(loader.finish())
}
