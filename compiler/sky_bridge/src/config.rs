//! The `CONFIG` global.
//!
//! Build files read host settings through one frozen struct. Its fields,
//! in assignment order (later assignments replace earlier ones):
//!
//! 1. every tagged string, bool or string-list field of every section;
//! 2. every `build_config` entry, upper-cased with `-` turned into `_`;
//! 3. the `package()` defaults and the host `OS` and `ARCH`.
//!
//! `OS` and `ARCH` use the names rule definitions compare against
//! (`linux`, `darwin`, `amd64`, `arm64`), not Rust's target names.

use std::sync::Arc;

use sky_eval::{Struct, Value};
use sky_graph::{Configuration, FieldValue};
use sky_ir::Name;

/// Name of the struct value, as shown by `type()` and `repr()`.
pub const CONFIG_STRUCT_NAME: &str = "config";

/// Build the `CONFIG` value for `config`.
pub fn make_config(config: &Configuration) -> Value {
    let mut fields: Vec<(Name, Value)> = Vec::with_capacity(128);

    config.for_each_field(&mut |_, field| {
        let Some(tag) = field.tag else {
            return;
        };
        let value = match field.value {
            FieldValue::Str(s) => Value::string(s),
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::StrList(items) => Value::string_list(items),
            FieldValue::Int(_) => return,
        };
        fields.push((Name::intern(tag), value));
    });

    for (key, value) in &config.build_config {
        fields.push((Name::intern(&setting_name(key)), Value::string(value)));
    }

    fields.push((Name::intern("DEFAULT_VISIBILITY"), Value::None));
    fields.push((Name::intern("DEFAULT_TESTONLY"), Value::Bool(false)));
    fields.push((Name::intern("DEFAULT_LICENCES"), Value::None));
    fields.push((Name::intern("OS"), Value::string(host_os())));
    fields.push((Name::intern("ARCH"), Value::string(host_arch())));

    let value = Value::Struct(Arc::new(Struct::new(CONFIG_STRUCT_NAME, fields)));
    value.freeze();
    value
}

/// `CONFIG.OS` for this host.
pub fn host_os() -> &'static str {
    os_name(std::env::consts::OS)
}

/// `CONFIG.ARCH` for this host.
pub fn host_arch() -> &'static str {
    arch_name(std::env::consts::ARCH)
}

fn os_name(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_name(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// `android-ndk` → `ANDROID_NDK`.
pub fn setting_name(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

#[cfg(test)]
mod tests;
