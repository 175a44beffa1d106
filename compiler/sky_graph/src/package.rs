//! Packages: the rules defined by one build file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::label::validate_rule_name;
use crate::{BuildLabel, BuildRule, GraphError};

/// Values `package()` can set for rules defined after it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageDefaults {
    pub visibility: Option<Vec<String>>,
    pub test_only: Option<bool>,
    pub licences: Option<Vec<String>>,
}

#[derive(Default)]
struct PackageState {
    rules: BTreeMap<String, BuildRule>,
    defaults: PackageDefaults,
}

/// A package under construction.
///
/// Several threads may evaluate build files that touch the same package
/// (through `subinclude`d helpers), so the mutable state sits behind a lock.
pub struct Package {
    name: String,
    dir: PathBuf,
    state: Mutex<PackageState>,
}

impl Package {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Package {
            name: name.into(),
            dir: dir.into(),
            state: Mutex::new(PackageState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of the package on disk.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn defaults(&self) -> PackageDefaults {
        self.state.lock().defaults.clone()
    }

    /// Replace the package defaults. Only allowed before the first rule.
    pub fn set_defaults(&self, defaults: PackageDefaults) -> Result<(), GraphError> {
        let mut state = self.state.lock();
        if !state.rules.is_empty() {
            return Err(GraphError::DefaultsAfterRules {
                package: self.name.clone(),
            });
        }
        state.defaults = defaults;
        Ok(())
    }

    /// Add a rule. Names must be valid and unique within the package.
    pub fn register_rule(&self, rule: BuildRule) -> Result<(), GraphError> {
        validate_rule_name(&rule.label.name)?;
        if rule.label.package != self.name {
            return Err(GraphError::ForeignRule {
                package: self.name.clone(),
                label: rule.label.to_string(),
            });
        }
        let mut state = self.state.lock();
        if state.rules.contains_key(&rule.label.name) {
            return Err(GraphError::DuplicateRule {
                package: self.name.clone(),
                name: rule.label.name,
            });
        }
        tracing::trace!(label = %rule.label, "registering rule");
        state.rules.insert(rule.label.name.clone(), rule);
        Ok(())
    }

    /// Run `f` on the rule called `name`.
    pub fn with_rule<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut BuildRule) -> R,
    ) -> Result<R, GraphError> {
        let mut state = self.state.lock();
        match state.rules.get_mut(name) {
            Some(rule) => Ok(f(rule)),
            None => Err(GraphError::UnknownRule {
                package: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Resolve a rule reference given as `name`, `:name` or `//pkg:name`.
    ///
    /// Only rules of this package can be referenced.
    pub fn resolve_rule_name(&self, target: &str) -> Result<String, GraphError> {
        if !target.starts_with("//") && !target.starts_with(':') {
            validate_rule_name(target)?;
            return Ok(target.to_string());
        }
        let label = BuildLabel::parse(target, &self.name)?;
        if label.package != self.name {
            return Err(GraphError::ForeignRule {
                package: self.name.clone(),
                label: label.to_string(),
            });
        }
        Ok(label.name)
    }

    pub fn rule(&self, name: &str) -> Option<BuildRule> {
        self.state.lock().rules.get(name).cloned()
    }

    /// Rule names, sorted.
    pub fn rule_names(&self) -> Vec<String> {
        self.state.lock().rules.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().rules.is_empty()
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("rules", &self.rule_names())
            .finish()
    }
}
