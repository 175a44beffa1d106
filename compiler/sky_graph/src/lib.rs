//! The host side of build-file evaluation.
//!
//! Build files describe packages of rules. This crate holds what they
//! describe into: the [`Configuration`] the tool was started with, the
//! [`BuildGraph`] of [`Package`]s and [`BuildRule`]s, and the [`Globber`]
//! that expands file patterns inside a package.

mod config;
mod errors;
mod glob;
mod graph;
mod label;
mod package;
mod rule;

pub use config::{
    AsFieldValue, BuildConfig, ConfigSection, Configuration, CppConfig, Field, FieldValue,
    GoConfig, JavaConfig, LicenceConfig, ParseConfig, PleaseConfig, ProtoConfig, PythonConfig,
};
pub use errors::{ConfigError, GlobError, GraphError};
pub use glob::{Globber, Pattern};
pub use graph::{BuildGraph, BuildState};
pub use label::{validate_rule_name, BuildLabel};
pub use package::{Package, PackageDefaults};
pub use rule::BuildRule;
