//! Module loading for `subinclude` and `load`.
//!
//! Paths are either repository-absolute (`//tools/defs.build_defs`, also
//! written `//tools:defs.build_defs`) or relative to the package being
//! parsed. Each file is evaluated against the frozen globals and its
//! bindings are cached for the rest of the process. Two contexts that miss
//! the cache together may both evaluate the file; the first result stored
//! is the one every later caller sees.

use std::fs;
use std::path::{Component, Path};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sky_eval::errors::load_error;
use sky_eval::{exec_file, Bindings, EvalError, Globals, Loader, Thread};

use crate::context::{build_state, current_package};

pub struct SubincludeLoader {
    globals: Globals,
    cache: Mutex<FxHashMap<String, Arc<Bindings>>>,
}

impl SubincludeLoader {
    pub fn new(globals: Globals) -> Self {
        SubincludeLoader {
            globals,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of files loaded so far.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    /// Repository-relative path of `module` as requested from `thread`.
    fn resolve(thread: &Thread, module: &str) -> Result<String, EvalError> {
        let path = if let Some(absolute) = module.strip_prefix("//") {
            absolute.replacen(':', "/", 1)
        } else {
            let package = current_package(thread)?;
            if package.name().is_empty() {
                module.to_string()
            } else {
                format!("{}/{module}", package.name())
            }
        };
        let escapes = Path::new(&path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(load_error(module, "path must stay inside the repository"));
        }
        Ok(path)
    }

    fn evaluate(&self, thread: &mut Thread, key: &str) -> Result<Bindings, EvalError> {
        let state = build_state(thread)?;
        let path = state.repo_root().join(key);
        let source =
            fs::read_to_string(&path).map_err(|e| load_error(&format!("//{key}"), e.to_string()))?;
        tracing::debug!(module = key, thread = thread.name(), "evaluating subinclude");
        exec_file(thread, &format!("//{key}"), &source, &self.globals)
    }
}

impl Loader for SubincludeLoader {
    fn load(&self, thread: &mut Thread, module: &str) -> Result<Arc<Bindings>, EvalError> {
        let key = Self::resolve(thread, module)?;
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        thread.enter_load(&key)?;
        let result = self.evaluate(thread, &key);
        thread.exit_load();

        let bindings = Arc::new(result?);
        let mut cache = self.cache.lock();
        Ok(Arc::clone(cache.entry(key).or_insert(bindings)))
    }
}

impl std::fmt::Debug for SubincludeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubincludeLoader")
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
