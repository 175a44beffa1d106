use pretty_assertions::assert_eq;

use super::*;
use crate::GlobalsBuilder;

fn exec(source: &str, globals: &Globals) -> Result<Bindings, EvalError> {
    let mut thread = Thread::new("module-test");
    exec_file(&mut thread, "defs.build_defs", source, globals)
}

#[test]
fn bindings_keep_definition_order() {
    let mut bindings = Bindings::default();
    bindings.insert(Name::intern("zeta"), Value::Int(1));
    bindings.insert(Name::intern("alpha"), Value::Int(2));
    bindings.insert(Name::intern("zeta"), Value::Int(3));
    assert_eq!(bindings.names(), vec!["zeta", "alpha"]);
    assert_eq!(bindings.get("zeta"), Some(&Value::Int(3)));
    assert_eq!(bindings.len(), 2);
}

#[test]
fn functions_see_only_the_snapshot_they_ran_against() {
    let mut builder = GlobalsBuilder::standard();
    let first = exec("def f():\n    return later()\n", &builder.snapshot());
    let first = match first {
        Ok(b) => b,
        Err(e) => panic!("{e}"),
    };
    builder.extend(&first);
    let second = exec("def later():\n    return 1\n", &builder.snapshot());
    let Ok(second) = second else {
        panic!("second file failed");
    };
    builder.extend(&second);

    let globals = builder.freeze();
    let err = exec("r = f()\n", &globals).err();
    assert!(matches!(err, Some(e) if e.message() == "name 'later' is not defined"));
}

#[test]
fn later_files_see_earlier_definitions() {
    let mut builder = GlobalsBuilder::standard();
    let Ok(first) = exec("PREFIX = 'lib_'\n", &builder.snapshot()) else {
        panic!("first file failed");
    };
    builder.extend(&first);
    let Ok(second) = exec("NAME = PREFIX + 'core'\n", &builder.snapshot()) else {
        panic!("second file failed");
    };
    assert_eq!(second.get("NAME"), Some(&Value::string("lib_core")));
}

#[test]
fn frozen_scope_rejects_definitions() {
    let scope = Arc::new(ModuleScope::new(Arc::from("f"), Arc::from(""), Globals::default()));
    assert!(scope.define(Name::intern("a"), Value::Int(1)).is_ok());
    let bindings = scope.freeze();
    assert_eq!(bindings.get("a"), Some(&Value::Int(1)));
    assert!(scope.define(Name::intern("b"), Value::Int(2)).is_err());
}

#[test]
fn module_bindings_shadow_predeclared() {
    let mut builder = GlobalsBuilder::new();
    builder.set("x", Value::Int(1));
    let globals = builder.freeze();
    let scope = ModuleScope::new(Arc::from("f"), Arc::from(""), globals);
    assert_eq!(scope.lookup(Name::intern("x")), Some(Value::Int(1)));
    assert!(scope.define(Name::intern("x"), Value::Int(2)).is_ok());
    assert_eq!(scope.lookup(Name::intern("x")), Some(Value::Int(2)));
}

#[test]
fn syntax_errors_carry_file_location() {
    let err = exec("x = = 1\n", &Globals::default()).err();
    let Some(err) = err else {
        panic!("expected syntax error");
    };
    assert_eq!(err.location.map(|l| l.to_string()).as_deref(), Some("defs.build_defs:1:5"));
}

fn helper_module(bindings: &Bindings) -> std::sync::Weak<ModuleScope> {
    let Some(Value::Function(helper)) = bindings.get("helper") else {
        panic!("helper is not a function");
    };
    helper.module.clone()
}

const HELPER: &str = "def helper():\n    return 1\nx = helper()\n";

#[test]
fn module_is_dropped_with_its_last_bindings() {
    let Ok(bindings) = exec(HELPER, &GlobalsBuilder::standard().freeze()) else {
        panic!("helper file failed");
    };
    let module = helper_module(&bindings);
    let helper = bindings.get("helper").cloned();
    assert!(module.upgrade().is_some());

    drop(helper);
    drop(bindings);
    assert!(module.upgrade().is_none());
}

#[test]
fn globals_keep_merged_modules_alive() {
    let mut builder = GlobalsBuilder::standard();
    let Ok(defs) = exec(HELPER, &builder.snapshot()) else {
        panic!("helper file failed");
    };
    builder.extend(&defs);
    let module = helper_module(&defs);
    drop(defs);

    let globals = builder.freeze();
    assert_eq!(globals.modules().len(), 1);
    let Ok(user) = exec("r = helper() + 1\n", &globals) else {
        panic!("calling helper failed");
    };
    assert_eq!(user.get("r"), Some(&Value::Int(2)));
    assert!(module.upgrade().is_some());

    drop(user);
    drop(globals);
    assert!(module.upgrade().is_none());
}

#[test]
fn function_outliving_its_module_fails_to_call() {
    let Ok(bindings) = exec(HELPER, &GlobalsBuilder::standard().freeze()) else {
        panic!("helper file failed");
    };
    let Some(helper) = bindings.get("helper").cloned() else {
        panic!("helper missing");
    };
    drop(bindings);

    let mut thread = Thread::new("orphan");
    let err = crate::call(&mut thread, &helper, crate::Arguments::positional(Vec::new())).err();
    assert!(matches!(err, Some(e) if e.message().contains("outlived the module")));
}
