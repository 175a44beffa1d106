//! Build state over a real directory tree.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sky_graph::{BuildLabel, BuildRule, BuildState, Configuration, Package};
use tempfile::TempDir;

#[test]
fn build_file_is_first_existing_name() {
    let repo = TempDir::new().unwrap();
    fs::create_dir_all(repo.path().join("src")).unwrap();
    fs::write(repo.path().join("src/BUILD.plz"), "").unwrap();

    let mut config = Configuration::default();
    config.parse.build_file_names = vec!["BUILD".to_string(), "BUILD.plz".to_string()];
    let state = BuildState::new(config, repo.path());

    assert_eq!(state.build_file("src"), Some(repo.path().join("src/BUILD.plz")));
    assert_eq!(state.build_file("missing"), None);
    assert_eq!(state.package_dir(""), repo.path().to_path_buf());
}

#[test]
fn packages_are_registered_once() {
    let state = BuildState::new(Configuration::default(), "/repo");
    let first = state.graph.add_package(Package::new("src", "/repo/src"));
    let second = state.graph.add_package(Package::new("src", "/elsewhere"));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(state.graph.package_names(), vec!["src".to_string()]);

    first
        .register_rule(BuildRule::new(BuildLabel::new("src", "lib")))
        .unwrap();
    assert!(state.graph.rule(&BuildLabel::new("src", "lib")).is_some());
    assert!(state.graph.rule(&BuildLabel::new("other", "lib")).is_none());
}

#[test]
fn concurrent_registration_into_separate_packages() {
    let state = Arc::new(BuildState::new(Configuration::default(), "/repo"));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                let name = format!("pkg{i}");
                let pkg = state.graph.add_package(Package::new(name.clone(), "/repo"));
                for r in 0..10 {
                    pkg.register_rule(BuildRule::new(BuildLabel::new(name.clone(), format!("r{r}"))))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(state.graph.len(), 8);
    for name in state.graph.package_names() {
        assert_eq!(state.graph.package(&name).map(|p| p.len()), Some(10));
    }
}
