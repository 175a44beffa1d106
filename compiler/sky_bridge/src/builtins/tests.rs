#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sky_eval::log_sink::{buffer_sink, LogRecord};
use sky_eval::{exec_file, Bindings, EvalError, Globals, Severity, SharedLogSink, Thread};
use sky_graph::{BuildLabel, BuildState, Package};
use tempfile::TempDir;

use super::*;
use crate::context::bind;

struct Harness {
    dir: TempDir,
    globals: Globals,
    state: Arc<BuildState>,
    package: Arc<Package>,
    log: SharedLogSink,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Configuration::default();
    let mut builder = GlobalsBuilder::standard();
    register_builtins(&mut builder, &config);
    let state = Arc::new(BuildState::new(config, dir.path()));
    let package = Arc::new(Package::new("app", state.package_dir("app")));
    Harness {
        globals: builder.freeze(),
        state,
        package,
        log: buffer_sink(),
        dir,
    }
}

impl Harness {
    fn run(&self, source: &str) -> Result<Bindings, EvalError> {
        let mut thread = Thread::new("test");
        thread.set_log_sink(self.log.clone());
        bind(&mut thread, Arc::clone(&self.package), Arc::clone(&self.state));
        exec_file(&mut thread, "app/BUILD", source, &self.globals)
    }

    fn rule(&self, name: &str) -> sky_graph::BuildRule {
        self.package.rule(name).unwrap()
    }
}

// === build_rule ===

#[test]
fn build_rule_records_every_argument() {
    let h = harness();
    h.run(
        "build_rule(\n\
         name = 'lib',\n\
         cmd = 'cc -o $OUT $SRCS',\n\
         test_cmd = '$TEST',\n\
         srcs = ['a.c', 'b.c'],\n\
         data = ['fixture.txt'],\n\
         outs = ['lib.a'],\n\
         deps = [':base', '//third_party:zlib'],\n\
         exported_deps = [':headers'],\n\
         tools = ['//tools:cc'],\n\
         labels = ['c'],\n\
         visibility = ['PUBLIC'],\n\
         licences = ['MIT'],\n\
         hashes = ['abc'],\n\
         binary = True,\n\
         test = True,\n\
         test_only = True,\n\
         building_description = 'Compiling...',\n\
         needs_transitive_deps = True,\n\
         output_is_complete = True,\n\
         )\n",
    )
    .unwrap();

    let rule = h.rule("lib");
    assert_eq!(rule.label, BuildLabel::new("app", "lib"));
    assert_eq!(rule.command, "cc -o $OUT $SRCS");
    assert_eq!(rule.test_command, "$TEST");
    assert_eq!(rule.sources, vec!["a.c", "b.c"]);
    assert_eq!(rule.data, vec!["fixture.txt"]);
    assert_eq!(rule.outputs, vec!["lib.a"]);
    assert_eq!(
        rule.dependencies,
        vec![
            BuildLabel::new("app", "base"),
            BuildLabel::new("third_party", "zlib"),
            BuildLabel::new("app", "headers"),
        ]
    );
    assert_eq!(rule.exported_dependencies, vec![BuildLabel::new("app", "headers")]);
    assert_eq!(rule.tools, vec!["//tools:cc"]);
    assert_eq!(rule.labels, vec!["c"]);
    assert_eq!(rule.visibility, vec!["PUBLIC"]);
    assert_eq!(rule.licences, vec!["MIT"]);
    assert_eq!(rule.hashes, vec!["abc"]);
    assert!(rule.is_binary && rule.is_test && rule.test_only);
    assert_eq!(rule.building_description, "Compiling...");
    assert!(rule.needs_transitive_dependencies && rule.output_is_complete);
}

#[test]
fn build_rule_accepts_per_config_commands_and_named_outputs() {
    let h = harness();
    h.run(
        "build_rule(name = 'x', cmd = {'opt': 'cc -O2', 'dbg': 'cc -g'}, \
         outs = {'lib': ['x.a'], 'hdrs': ['x.h']})\n",
    )
    .unwrap();

    let rule = h.rule("x");
    assert_eq!(rule.command_for("opt"), "cc -O2");
    assert_eq!(rule.command_for("dbg"), "cc -g");
    assert_eq!(rule.named_outputs.get("hdrs"), Some(&vec!["x.h".to_string()]));
    assert_eq!(rule.outputs.len(), 2);
}

#[test]
fn build_rule_rejects_duplicates_and_bad_names() {
    let h = harness();
    let err = h
        .run("build_rule(name = 'x')\nbuild_rule(name = 'x')\n")
        .unwrap_err();
    assert!(err.to_string().contains("duplicate rule 'x' in package 'app'"), "{err}");

    let err = h.run("build_rule(name = 'a b')\n").unwrap_err();
    assert!(err.to_string().contains("invalid rule name 'a b'"), "{err}");

    let err = h.run("build_rule(cmd = 'true')\n").unwrap_err();
    assert!(err.to_string().contains("name"), "{err}");
}

#[test]
fn rules_without_a_bound_package_are_an_invariant_violation() {
    let h = harness();
    let mut thread = Thread::new("unbound");
    let err = exec_file(&mut thread, "BUILD", "build_rule(name = 'x')\n", &h.globals).unwrap_err();
    assert!(err.is_invariant());
}

// === package ===

#[test]
fn package_defaults_apply_to_later_rules() {
    let h = harness();
    h.run(
        "package(default_visibility = ['//app/...'], default_testonly = True, default_licences = ['BSD'])\n\
         build_rule(name = 'a')\n\
         build_rule(name = 'b', visibility = ['PUBLIC'], test_only = False, licences = ['MIT'])\n",
    )
    .unwrap();

    let a = h.rule("a");
    assert_eq!(a.visibility, vec!["//app/..."]);
    assert!(a.test_only);
    assert_eq!(a.licences, vec!["BSD"]);

    let b = h.rule("b");
    assert_eq!(b.visibility, vec!["PUBLIC"]);
    assert!(!b.test_only);
    assert_eq!(b.licences, vec!["MIT"]);
}

#[test]
fn package_must_come_before_rules() {
    let h = harness();
    let err = h
        .run("build_rule(name = 'a')\npackage(default_testonly = True)\n")
        .unwrap_err();
    assert!(err.to_string().contains("before any rules"), "{err}");
}

#[test]
fn package_takes_keywords_only() {
    let h = harness();
    let err = h.run("package(['PUBLIC'])\n").unwrap_err();
    assert!(err.to_string().contains("keyword arguments only"), "{err}");
}

#[test]
fn package_name_is_the_bound_package() {
    let h = harness();
    let bindings = h.run("x = package_name()\n").unwrap();
    assert_eq!(bindings.get("x"), Some(&Value::string("app")));
}

// === Mutators ===

#[test]
fn commands_can_be_read_and_replaced() {
    let h = harness();
    let bindings = h
        .run(
            "build_rule(name = 'x', cmd = 'old')\n\
             set_command(':x', 'new')\n\
             set_command('x', 'dbg', 'debug')\n\
             a = get_command('x')\n\
             b = get_command('//app:x', 'dbg')\n\
             c = get_command('x', 'opt')\n",
        )
        .unwrap();
    assert_eq!(bindings.get("a"), Some(&Value::string("new")));
    assert_eq!(bindings.get("b"), Some(&Value::string("debug")));
    assert_eq!(bindings.get("c"), Some(&Value::string("")));
}

#[test]
fn outputs_licences_and_deps_can_be_added() {
    let h = harness();
    h.run(
        "build_rule(name = 'x')\n\
         add_out('x', 'x.o')\n\
         add_out('x', 'hdrs', 'x.h')\n\
         add_licence('x', 'MIT')\n\
         add_licence('x', 'MIT')\n\
         add_dep('x', ':y')\n\
         add_dep('x', '//lib:z', True)\n\
         add_exported_dep(':x', ':w')\n",
    )
    .unwrap();

    let rule = h.rule("x");
    assert_eq!(rule.outputs, vec!["x.o", "x.h"]);
    assert_eq!(rule.named_outputs.get("hdrs"), Some(&vec!["x.h".to_string()]));
    assert_eq!(rule.licences, vec!["MIT"]);
    assert_eq!(
        rule.dependencies,
        vec![
            BuildLabel::new("app", "y"),
            BuildLabel::new("lib", "z"),
            BuildLabel::new("app", "w"),
        ]
    );
    assert_eq!(
        rule.exported_dependencies,
        vec![BuildLabel::new("lib", "z"), BuildLabel::new("app", "w")]
    );
}

#[test]
fn mutators_only_reach_rules_of_the_bound_package() {
    let h = harness();
    let err = h.run("set_command('missing', 'x')\n").unwrap_err();
    assert!(err.to_string().contains("no rule named 'missing'"), "{err}");

    let err = h
        .run("build_rule(name = 'x')\nadd_licence('//other:x', 'MIT')\n")
        .unwrap_err();
    assert!(err.to_string().contains("is not in package 'app'"), "{err}");
}

#[test]
fn get_labels_is_empty_during_parsing() {
    let h = harness();
    let bindings = h
        .run("build_rule(name = 'x', labels = ['cc:ld:-lz'])\nl = get_labels(':x', 'cc:ld:')\n")
        .unwrap();
    assert_eq!(bindings.get("l"), Some(&Value::list(Vec::new())));
}

// === fail and log ===

#[test]
fn fail_joins_its_arguments() {
    let h = harness();
    let err = h.run("fail('bad', 'input', 3)\n").unwrap_err();
    assert_eq!(err.message(), "bad input 3");
    assert!(!err.is_fatal());

    let err = h.run("fail()\n").unwrap_err();
    assert!(err.to_string().contains("fail: message is required"), "{err}");
}

#[test]
fn log_members_write_to_the_sink() {
    let h = harness();
    h.run(
        "log.debug('d')\n\
         log.notice('%s has %d rules', 'app', 2)\n\
         log.warning('100%')\n",
    )
    .unwrap();
    assert_eq!(
        h.log.records(),
        vec![
            LogRecord {
                severity: Severity::Debug,
                message: "d".to_string(),
            },
            LogRecord {
                severity: Severity::Notice,
                message: "app has 2 rules".to_string(),
            },
            LogRecord {
                severity: Severity::Warning,
                message: "100%".to_string(),
            },
        ]
    );
}

#[test]
fn log_fatal_aborts_the_parse() {
    let h = harness();
    let err = h
        .run("log.fatal('cannot continue: %s', 'reason')\nbuild_rule(name = 'never')\n")
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(h.package.is_empty());
    assert_eq!(
        h.log.records(),
        vec![LogRecord {
            severity: Severity::Fatal,
            message: "cannot continue: reason".to_string(),
        }]
    );
}

// === glob ===

#[test]
fn glob_lists_files_in_the_package() {
    let h = harness();
    let root = h.dir.path().join("app");
    for file in ["a.py", "b.py", "b_test.py", "sub/c.py", ".hidden.py", "README"] {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    let bindings = h
        .run(
            "all = glob(['**/*.py'])\n\
             top = glob(['*.py'], exclude = ['*_test.py'])\n\
             hidden = glob(['*.py'], hidden = True, excludes = ['b*'])\n",
        )
        .unwrap();
    assert_eq!(
        bindings.get("all"),
        Some(&Value::string_list(&["a.py", "b.py", "b_test.py", "sub/c.py"]))
    );
    assert_eq!(bindings.get("top"), Some(&Value::string_list(&["a.py", "b.py"])));
    assert_eq!(
        bindings.get("hidden"),
        Some(&Value::string_list(&[".hidden.py", "a.py"]))
    );
}

#[test]
fn glob_skips_subpackages() {
    let h = harness();
    let root = h.dir.path().join("app");
    for file in ["a.txt", "nested/BUILD", "nested/b.txt"] {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    let bindings = h.run("files = glob(['**/*.txt'])\n").unwrap();
    assert_eq!(bindings.get("files"), Some(&Value::string_list(&["a.txt"])));
}

// === CONFIG ===

#[test]
fn config_is_visible_to_build_files() {
    let h = harness();
    let bindings = h
        .run("lang = CONFIG.BUILD_CONFIG\nos = CONFIG.OS\nvis = CONFIG.DEFAULT_VISIBILITY\n")
        .unwrap();
    assert_eq!(bindings.get("lang"), Some(&Value::string("opt")));
    assert_eq!(bindings.get("os"), Some(&Value::string(crate::host_os())));
    assert_eq!(bindings.get("vis"), Some(&Value::None));
}
