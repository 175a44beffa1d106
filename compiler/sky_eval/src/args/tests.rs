use super::*;

fn named(name: &str, value: Value) -> (Name, Value) {
    (Name::intern(name), value)
}

#[test]
fn positional_then_named() {
    let args = Arguments {
        positional: vec![Value::string("x")],
        named: vec![named("binary", Value::Bool(true))],
    };
    let [name, srcs, binary] = args
        .bind("build_rule", ["name", "srcs?", "binary?"])
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(name, Some(Value::string("x")));
    assert_eq!(srcs, None);
    assert_eq!(binary, Some(Value::Bool(true)));
}

#[test]
fn missing_required() {
    let err = Arguments::default().bind("glob", ["includes", "exclude?"]);
    assert!(matches!(err, Err(e) if e.to_string() == "glob: missing required argument 'includes'"));
}

#[test]
fn unknown_keyword() {
    let args = Arguments {
        positional: Vec::new(),
        named: vec![named("bogus", Value::None)],
    };
    let err = args.bind("package", ["default_visibility?"]);
    assert!(matches!(err, Err(e) if e.to_string().contains("unexpected keyword argument 'bogus'")));
}

#[test]
fn duplicate_value() {
    let args = Arguments {
        positional: vec![Value::string("a")],
        named: vec![named("name", Value::string("b"))],
    };
    assert!(args.bind("f", ["name"]).is_err());
}

#[test]
fn too_many_positional() {
    let args = Arguments::positional(vec![Value::Int(1), Value::Int(2)]);
    assert!(args.bind("f", ["a"]).is_err());
}

#[test]
fn string_list_conversion() {
    let list = Value::string_list(&["a", "b"]);
    assert_eq!(
        list.into_string_list("srcs").ok(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
    let mixed = Value::list(vec![Value::string("a"), Value::Int(1)]);
    assert!(mixed.into_string_list("srcs").is_err());
}
