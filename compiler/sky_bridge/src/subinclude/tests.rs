#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sky_eval::log_sink::{buffer_sink, LogRecord};
use sky_eval::{GlobalsBuilder, Severity, SharedLogSink, Value};
use sky_graph::{BuildState, Configuration, Package};
use tempfile::TempDir;

use super::*;
use crate::builtins::register_builtins;
use crate::context::bind;

struct Fixture {
    _dir: TempDir,
    state: Arc<BuildState>,
    globals: Globals,
    loader: Arc<SubincludeLoader>,
    log: SharedLogSink,
}

fn fixture(files: &[(&str, &str)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let config = Configuration::default();
    let mut builder = GlobalsBuilder::standard();
    register_builtins(&mut builder, &config);
    let globals = builder.freeze();
    Fixture {
        state: Arc::new(BuildState::new(config, dir.path())),
        loader: Arc::new(SubincludeLoader::new(globals.clone())),
        globals,
        log: buffer_sink(),
        _dir: dir,
    }
}

impl Fixture {
    fn run(&self, package: &str, source: &str) -> Result<Bindings, EvalError> {
        let mut thread = Thread::new("test");
        thread.set_loader(self.loader.clone());
        thread.set_log_sink(self.log.clone());
        let pkg = self
            .state
            .graph
            .add_package(Package::new(package, self.state.package_dir(package)));
        bind(&mut thread, pkg, Arc::clone(&self.state));
        exec_file(&mut thread, &format!("{package}/BUILD"), source, &self.globals)
    }
}

#[test]
fn subinclude_defines_public_names_in_the_caller() {
    let fx = fixture(&[(
        "defs/go.build_defs",
        "def go_library(name):\n    return 'go:' + name\n\n_internal = 1\nVERSION = '1.21'\n",
    )]);
    let bindings = fx
        .run("app", "subinclude('//defs/go.build_defs')\nx = go_library('lib') + VERSION\n")
        .unwrap();
    assert_eq!(bindings.get("x"), Some(&Value::string("go:lib1.21")));
    assert!(bindings.get("_internal").is_none());
    assert!(bindings.get("go_library").is_some());
}

#[test]
fn colon_form_and_relative_paths_resolve() {
    let fx = fixture(&[
        ("defs/a.build_defs", "A = 'a'\n"),
        ("app/local.build_defs", "B = 'b'\n"),
    ]);
    let bindings = fx
        .run("app", "subinclude('//defs:a.build_defs', 'local.build_defs')\nx = A + B\n")
        .unwrap();
    assert_eq!(bindings.get("x"), Some(&Value::string("ab")));
}

#[test]
fn each_file_is_evaluated_once() {
    let fx = fixture(&[("defs/a.build_defs", "print('evaluated')\nA = 1\n")]);
    fx.run("one", "subinclude('//defs/a.build_defs')\n").unwrap();
    fx.run("two", "subinclude('//defs/a.build_defs')\n").unwrap();
    assert_eq!(fx.loader.cached(), 1);
    assert_eq!(
        fx.log.records(),
        vec![LogRecord {
            severity: Severity::Info,
            message: "evaluated".to_string(),
        }]
    );
}

#[test]
fn load_statement_uses_the_same_loader() {
    let fx = fixture(&[("defs/a.build_defs", "def double(x):\n    return x * 2\n")]);
    let bindings = fx
        .run("app", "load('//defs/a.build_defs', 'double')\ny = double(21)\n")
        .unwrap();
    assert_eq!(bindings.get("y"), Some(&Value::Int(42)));
}

#[test]
fn cycles_are_reported() {
    let fx = fixture(&[
        ("defs/a.build_defs", "subinclude('//defs/b.build_defs')\n"),
        ("defs/b.build_defs", "subinclude('//defs/a.build_defs')\n"),
    ]);
    let err = fx.run("app", "subinclude('//defs/a.build_defs')\n").unwrap_err();
    assert!(err.to_string().contains("cycle in load graph"), "{err}");
    assert_eq!(fx.loader.cached(), 0);
}

#[test]
fn paths_outside_the_repository_are_rejected() {
    let fx = fixture(&[]);
    let err = fx.run("app", "subinclude('../secret.build_defs')\n").unwrap_err();
    assert!(err.to_string().contains("inside the repository"), "{err}");
}

#[test]
fn missing_files_fail_the_caller() {
    let fx = fixture(&[]);
    let err = fx.run("app", "subinclude('//nope.build_defs')\n").unwrap_err();
    assert!(err.to_string().contains("//nope.build_defs"), "{err}");
}
