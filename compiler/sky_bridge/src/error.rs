//! Errors surfaced to the host.

use std::path::PathBuf;

use sky_eval::EvalError;
use thiserror::Error;

use crate::PoolError;

/// Failure while building the global namespace. Fatal to startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load build definitions from {asset}: {source}")]
    Asset {
        asset: String,
        #[source]
        source: EvalError,
    },

    #[error("cannot read preloaded build definitions {}: {source}", path.display())]
    Preload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start parse workers: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}

/// Failure while parsing one package.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The build file raised an ordinary error; other packages proceed.
    #[error("{package}: {source}")]
    Evaluation {
        package: String,
        #[source]
        source: EvalError,
    },

    /// `log.fatal` was called.
    #[error("{package}: {source}")]
    Fatal {
        package: String,
        #[source]
        source: EvalError,
    },

    /// The evaluation machinery itself is broken.
    #[error("invariant violation: {message}")]
    Invariant { message: String },

    #[error("package '{package}' has no build file")]
    NoBuildFile { package: String },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Classify an evaluation failure of `package`.
    pub fn from_eval(package: &str, err: EvalError) -> Self {
        if err.is_fatal() {
            ParseError::Fatal {
                package: package.to_string(),
                source: err,
            }
        } else if err.is_invariant() {
            ParseError::Invariant {
                message: format!("{package}: {err}"),
            }
        } else {
            ParseError::Evaluation {
                package: package.to_string(),
                source: err,
            }
        }
    }

    /// Whether the whole parse must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::Fatal { .. } | ParseError::Invariant { .. })
    }

    /// Log the error and terminate the process.
    pub fn exit(self) -> ! {
        tracing::error!("{self}");
        std::process::exit(1)
    }
}

impl From<PoolError> for ParseError {
    fn from(err: PoolError) -> Self {
        ParseError::Invariant {
            message: err.to_string(),
        }
    }
}
