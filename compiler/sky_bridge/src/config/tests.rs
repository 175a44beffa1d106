use pretty_assertions::assert_eq;

use super::*;

fn field(config: &Value, name: &str) -> Option<Value> {
    match config {
        Value::Struct(s) => s.get(Name::intern(name)).cloned(),
        _ => None,
    }
}

#[test]
fn tagged_fields_are_converted() {
    let mut config = Configuration::default();
    config.python.default_interpreter = "python3.11".to_string();
    config.python.use_pypi = false;
    config.proto.language = vec!["go".to_string(), "py".to_string(), "go".to_string()];
    let value = make_config(&config);

    assert_eq!(
        field(&value, "DEFAULT_PYTHON_INTERPRETER"),
        Some(Value::string("python3.11"))
    );
    assert_eq!(field(&value, "USE_PYPI"), Some(Value::Bool(false)));
    assert_eq!(
        field(&value, "PROTO_LANGUAGES"),
        Some(Value::string_list(&["go", "py", "go"]))
    );
}

#[test]
fn untagged_and_integer_fields_are_skipped() {
    let value = make_config(&Configuration::default());
    assert_eq!(field(&value, "num_threads"), None);
    assert_eq!(field(&value, "timeout"), None);
    assert_eq!(field(&value, "preload_build_defs"), None);
}

#[test]
fn fixed_names_come_last() {
    let value = make_config(&Configuration::default());
    let Value::Struct(s) = &value else {
        panic!("CONFIG must be a struct");
    };
    let names: Vec<&str> = s.fields().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names[names.len() - 5..].to_vec(),
        vec!["DEFAULT_VISIBILITY", "DEFAULT_TESTONLY", "DEFAULT_LICENCES", "OS", "ARCH"]
    );
    assert_eq!(field(&value, "DEFAULT_TESTONLY"), Some(Value::Bool(false)));
    assert_eq!(field(&value, "DEFAULT_LICENCES"), Some(Value::None));
    assert_eq!(field(&value, "OS"), Some(Value::string(host_os())));
}

#[test]
fn platform_names_follow_build_file_conventions() {
    assert_eq!(os_name("macos"), "darwin");
    assert_eq!(os_name("linux"), "linux");
    assert_eq!(os_name("freebsd"), "freebsd");
    assert_eq!(arch_name("x86_64"), "amd64");
    assert_eq!(arch_name("aarch64"), "arm64");
    assert_eq!(arch_name("x86"), "386");
    assert_eq!(arch_name("riscv64"), "riscv64");

    let value = make_config(&Configuration::default());
    assert_eq!(field(&value, "ARCH"), Some(Value::string(host_arch())));
    assert_ne!(host_os(), "macos");
    assert_ne!(host_arch(), "x86_64");
}

#[test]
fn settings_are_rekeyed_and_override_tags() {
    let mut config = Configuration::default();
    config
        .build_config
        .insert("android-ndk".to_string(), "r16".to_string());
    config
        .build_config
        .insert("cc-tool".to_string(), "clang".to_string());
    let value = make_config(&config);
    assert_eq!(field(&value, "ANDROID_NDK"), Some(Value::string("r16")));
    assert_eq!(field(&value, "CC_TOOL"), Some(Value::string("clang")));
}

#[test]
fn config_is_frozen() {
    let value = make_config(&Configuration::default());
    let Some(Value::List(path)) = field(&value, "BUILD_PATH") else {
        panic!("BUILD_PATH should be a list");
    };
    assert!(path.is_frozen());
}

#[test]
fn setting_names() {
    assert_eq!(setting_name("foo-bar-baz"), "FOO_BAR_BAZ");
    assert_eq!(setting_name("Already_Upper"), "ALREADY_UPPER");
}
