//! Errors raised by the build graph and the globber.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to parse a label or to update a package.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("invalid build label '{label}': {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    #[error("invalid rule name '{name}': {reason}")]
    InvalidRuleName { name: String, reason: &'static str },

    #[error("duplicate rule '{name}' in package '{package}'")]
    DuplicateRule { package: String, name: String },

    #[error("no rule named '{name}' in package '{package}'")]
    UnknownRule { package: String, name: String },

    #[error("{label} is not in package '{package}'")]
    ForeignRule { package: String, label: String },

    #[error("package() must be called before any rules are defined in '{package}'")]
    DefaultsAfterRules { package: String },
}

/// Failure while expanding a glob.
#[derive(Debug, Error)]
pub enum GlobError {
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}
