//! Build rules as registered by build files.

use std::collections::BTreeMap;

use crate::BuildLabel;

/// One target in the build graph.
///
/// List-valued mutators (`add_output`, `add_dependency`, ...) ignore values
/// already present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildRule {
    pub label: BuildLabel,
    pub command: String,
    /// Commands keyed by build config (e.g. `dbg`, `opt`).
    pub commands: BTreeMap<String, String>,
    pub test_command: String,
    pub sources: Vec<String>,
    pub data: Vec<String>,
    pub outputs: Vec<String>,
    pub named_outputs: BTreeMap<String, Vec<String>>,
    pub dependencies: Vec<BuildLabel>,
    pub exported_dependencies: Vec<BuildLabel>,
    pub tools: Vec<String>,
    pub labels: Vec<String>,
    pub visibility: Vec<String>,
    pub licences: Vec<String>,
    pub hashes: Vec<String>,
    pub is_binary: bool,
    pub is_test: bool,
    pub test_only: bool,
    pub building_description: String,
    pub needs_transitive_dependencies: bool,
    pub output_is_complete: bool,
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

impl BuildRule {
    pub fn new(label: BuildLabel) -> Self {
        BuildRule {
            label,
            ..BuildRule::default()
        }
    }

    /// The command for `config`; the default command when `config` is empty.
    pub fn command_for(&self, config: &str) -> &str {
        if config.is_empty() {
            &self.command
        } else {
            self.commands.get(config).map_or("", String::as_str)
        }
    }

    pub fn set_command_for(&mut self, config: &str, command: impl Into<String>) {
        if config.is_empty() {
            self.command = command.into();
        } else {
            self.commands.insert(config.to_string(), command.into());
        }
    }

    pub fn add_output(&mut self, output: impl Into<String>) {
        push_unique(&mut self.outputs, output.into());
    }

    /// Add an output under a name; it is also one of the rule's outputs.
    pub fn add_named_output(&mut self, name: &str, output: impl Into<String>) {
        let output = output.into();
        push_unique(
            self.named_outputs.entry(name.to_string()).or_default(),
            output.clone(),
        );
        self.add_output(output);
    }

    pub fn add_licence(&mut self, licence: impl Into<String>) {
        push_unique(&mut self.licences, licence.into());
    }

    pub fn add_dependency(&mut self, dep: BuildLabel) {
        push_unique(&mut self.dependencies, dep);
    }

    /// Exported dependencies are also ordinary dependencies.
    pub fn add_exported_dependency(&mut self, dep: BuildLabel) {
        push_unique(&mut self.exported_dependencies, dep.clone());
        self.add_dependency(dep);
    }
}
