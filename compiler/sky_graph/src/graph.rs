//! The build graph and the state shared by all parse workers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::{BuildLabel, BuildRule, Configuration, Globber, Package};

/// All packages known to the build, keyed by package name.
#[derive(Default)]
pub struct BuildGraph {
    packages: DashMap<String, Arc<Package>>,
}

impl BuildGraph {
    pub fn new() -> Self {
        BuildGraph::default()
    }

    /// Insert `package`, or return the one already registered under its name.
    pub fn add_package(&self, package: Package) -> Arc<Package> {
        Arc::clone(
            self.packages
                .entry(package.name().to_string())
                .or_insert_with(|| Arc::new(package))
                .value(),
        )
    }

    pub fn package(&self, name: &str) -> Option<Arc<Package>> {
        self.packages.get(name).map(|p| Arc::clone(p.value()))
    }

    pub fn rule(&self, label: &BuildLabel) -> Option<BuildRule> {
        self.package(&label.package)?.rule(&label.name)
    }

    /// Package names, sorted.
    pub fn package_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.packages.iter().map(|p| p.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// State shared by every worker for the duration of a build.
pub struct BuildState {
    pub config: Arc<Configuration>,
    pub repo_root: PathBuf,
    pub graph: BuildGraph,
    pub globber: Globber,
}

impl BuildState {
    pub fn new(config: Configuration, repo_root: impl Into<PathBuf>) -> Self {
        let globber = Globber::new(config.parse.build_file_names.clone());
        BuildState {
            config: Arc::new(config),
            repo_root: repo_root.into(),
            graph: BuildGraph::new(),
            globber,
        }
    }

    /// Directory of `package` on disk.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        if package.is_empty() {
            self.repo_root.clone()
        } else {
            self.repo_root.join(package)
        }
    }

    /// The build file of `package`: the first name in
    /// `parse.build_file_names` that exists in the package directory.
    pub fn build_file(&self, package: &str) -> Option<PathBuf> {
        let dir = self.package_dir(package);
        self.config
            .parse
            .build_file_names
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

impl std::fmt::Debug for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildState")
            .field("repo_root", &self.repo_root)
            .field("packages", &self.graph.len())
            .finish_non_exhaustive()
    }
}
