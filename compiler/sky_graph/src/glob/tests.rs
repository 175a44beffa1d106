#![allow(clippy::unwrap_used)]

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// a.txt b.txt skip.txt .hidden.txt lib.go
/// nested/deep/d.txt
/// sub/BUILD sub/c.txt   (a subpackage)
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for file in ["a.txt", "b.txt", "skip.txt", ".hidden.txt", "lib.go"] {
        fs::write(root.join(file), "").unwrap();
    }
    fs::create_dir_all(root.join("nested/deep")).unwrap();
    fs::write(root.join("nested/deep/d.txt"), "").unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub/BUILD"), "").unwrap();
    fs::write(root.join("sub/c.txt"), "").unwrap();
    dir
}

fn glob(dir: &TempDir, includes: &[&str], excludes: &[&str], hidden: bool) -> Vec<String> {
    let globber = Globber::new(strings(&["BUILD"]));
    let excludes = strings(excludes);
    globber
        .glob(dir.path(), &strings(includes), &excludes, &excludes, hidden)
        .unwrap()
}

#[test]
fn excludes_are_applied() {
    let dir = fixture();
    assert_eq!(glob(&dir, &["*.txt"], &["skip.txt"], false), strings(&["a.txt", "b.txt"]));
}

#[test]
fn hidden_files_are_opt_in() {
    let dir = fixture();
    assert!(!glob(&dir, &["*.txt"], &[], false).contains(&".hidden.txt".to_string()));
    assert!(glob(&dir, &["*.txt"], &[], true).contains(&".hidden.txt".to_string()));
}

#[test]
fn recursive_glob_skips_subpackages() {
    let dir = fixture();
    assert_eq!(
        glob(&dir, &["**/*.txt"], &["skip.txt"], false),
        strings(&["a.txt", "b.txt", "nested/deep/d.txt"])
    );
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("a.txt"), "").unwrap();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real/b.txt"), "").unwrap();
    std::os::unix::fs::symlink(".", root.join("loop")).unwrap();
    std::os::unix::fs::symlink("real", root.join("alias")).unwrap();
    std::os::unix::fs::symlink("a.txt", root.join("link.txt")).unwrap();

    assert_eq!(
        glob(&dir, &["**/*.txt"], &[], false),
        strings(&["a.txt", "link.txt", "real/b.txt"])
    );
}

#[test]
fn name_excludes_apply_at_any_depth() {
    let dir = fixture();
    assert_eq!(
        glob(&dir, &["**/*.txt"], &["d.txt", "?.txt"], false),
        strings(&["skip.txt"])
    );
}

#[test]
fn multiple_includes_are_merged_and_sorted() {
    let dir = fixture();
    assert_eq!(
        glob(&dir, &["*.go", "[ab].txt", "a.txt"], &[], false),
        strings(&["a.txt", "b.txt", "lib.go"])
    );
}

#[test]
fn invalid_patterns_are_errors() {
    let dir = fixture();
    let globber = Globber::default();
    for pattern in ["[a", "/abs/*.txt", "../*.txt", ""] {
        assert!(
            globber
                .glob(dir.path(), &strings(&[pattern]), &[], &[], false)
                .is_err(),
            "{pattern:?} should be rejected"
        );
    }
}

#[test]
fn wildcard_matching() {
    let cases = [
        ("*.txt", "a.txt", true),
        ("*.txt", "a.txt.bak", false),
        ("a*b*c", "axxbyyc", true),
        ("a*b*c", "axxbyy", false),
        ("?.go", "x.go", true),
        ("?.go", "xy.go", false),
        ("[!a]*", "b1", true),
        ("[!a]*", "a1", false),
        ("[a-c]", "b", true),
        ("[]x]", "]", true),
        ("**", "a/b/c", true),
        ("src/**/*.rs", "src/lib.rs", true),
        ("src/**/*.rs", "src/a/b/lib.rs", true),
        ("src/*.rs", "src/a/lib.rs", false),
    ];
    for (pattern, path, expected) in cases {
        let compiled = Pattern::new(pattern).unwrap();
        assert_eq!(compiled.matches(path), expected, "{pattern} vs {path}");
    }
}
