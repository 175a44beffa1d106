//! Parsing packages with a fixed set of workers.
//!
//! Startup builds the global namespace once (see [`crate::loader`]); after
//! that every worker checks a context out of the shared pool, binds it to
//! the package it is parsing and runs the package's build file.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use sky_eval::log_sink::tracing_sink;
use sky_eval::{Globals, SharedLogSink};
use sky_graph::{BuildState, Package};

use crate::loader::load_globals;
use crate::pool::ContextPool;
use crate::subinclude::SubincludeLoader;
use crate::{ParseError, StartupError};

/// Result of parsing one package.
#[derive(Debug)]
pub struct PackageOutcome {
    pub name: String,
    pub result: Result<Arc<Package>, ParseError>,
}

pub struct Parser {
    state: Arc<BuildState>,
    pool: ContextPool,
    workers: rayon::ThreadPool,
}

impl Parser {
    pub fn new(state: Arc<BuildState>) -> Result<Self, StartupError> {
        Self::with_log_sink(state, tracing_sink())
    }

    /// Load all rule definitions and create one context per worker.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn with_log_sink(state: Arc<BuildState>, log: SharedLogSink) -> Result<Self, StartupError> {
        let globals = load_globals(&state.config, state.repo_root(), log.clone())?;
        let size = state.config.num_workers();
        let loader = Arc::new(SubincludeLoader::new(globals.clone()));
        let pool = ContextPool::new(size, globals, loader, log);
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(size.max(1))
            .thread_name(|i| format!("sky-parse-{i}"))
            .build()?;
        tracing::info!(workers = size, "parser ready");
        Ok(Parser {
            state,
            pool,
            workers,
        })
    }

    pub fn state(&self) -> &Arc<BuildState> {
        &self.state
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    pub fn globals(&self) -> &Globals {
        self.pool.globals()
    }

    /// Run the build file at `path` on behalf of `package`.
    #[tracing::instrument(level = "debug", skip(self, package), fields(package = package.name()))]
    pub fn parse_file(&self, package: &Arc<Package>, path: &Path) -> Result<(), ParseError> {
        let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = path
            .strip_prefix(self.state.repo_root())
            .unwrap_or(path)
            .display()
            .to_string();

        let mut context = self
            .pool
            .acquire()?
            .bind(Arc::clone(package), Arc::clone(&self.state));
        context
            .exec_file(&file, &source)
            .map_err(|err| ParseError::from_eval(package.name(), err))?;
        tracing::debug!(rules = package.len(), "parsed build file");
        Ok(())
    }

    /// Find, register and parse the package `name`.
    pub fn parse_package(&self, name: &str) -> Result<Arc<Package>, ParseError> {
        let Some(path) = self.state.build_file(name) else {
            return Err(ParseError::NoBuildFile {
                package: name.to_string(),
            });
        };
        let package = self
            .state
            .graph
            .add_package(Package::new(name, self.state.package_dir(name)));
        self.parse_file(&package, &path)?;
        Ok(package)
    }

    /// Parse `names` on the worker pool.
    ///
    /// Ordinary failures are reported per package. The first fatal error
    /// (in input order) stops the run: packages not yet started are skipped
    /// and the error is returned.
    pub fn parse_packages(&self, names: &[String]) -> Result<Vec<PackageOutcome>, ParseError> {
        let stop = AtomicBool::new(false);
        let outcomes: Vec<Option<PackageOutcome>> = self.workers.install(|| {
            names
                .par_iter()
                .map(|name| {
                    if stop.load(Ordering::Acquire) {
                        return None;
                    }
                    let result = self.parse_package(name);
                    if result.as_ref().is_err_and(ParseError::is_fatal) {
                        stop.store(true, Ordering::Release);
                    }
                    Some(PackageOutcome {
                        name: name.clone(),
                        result,
                    })
                })
                .collect()
        });

        let mut parsed = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.into_iter().flatten() {
            match outcome.result {
                Err(err) if err.is_fatal() => return Err(err),
                result => parsed.push(PackageOutcome {
                    name: outcome.name,
                    result,
                }),
            }
        }
        Ok(parsed)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("repo_root", &self.state.repo_root())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
