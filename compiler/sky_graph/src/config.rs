//! Host configuration.
//!
//! Sections are plain structs with defaulted fields so a partial JSON
//! document is enough to load one. Each section lists its fields through
//! [`ConfigSection::for_each_field`]; fields carrying a tag are the ones
//! exposed to build files under that tag.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// A field value as seen by consumers that walk the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Bool(bool),
    StrList(&'a [String]),
    Int(u64),
}

/// One field of a configuration section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field<'a> {
    /// Rust field name.
    pub name: &'static str,
    /// External name, if the field is exported.
    pub tag: Option<&'static str>,
    pub value: FieldValue<'a>,
}

/// A named group of configuration fields.
pub trait ConfigSection {
    /// Section name as it appears in config files.
    const NAME: &'static str;

    /// Visit every field, in declaration order.
    fn for_each_field<'a>(&'a self, visit: &mut dyn FnMut(Field<'a>));
}

/// Conversion of a field's storage type into a [`FieldValue`].
pub trait AsFieldValue {
    fn as_field_value(&self) -> FieldValue<'_>;
}

impl AsFieldValue for String {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for bool {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl AsFieldValue for Vec<String> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::StrList(self)
    }
}

impl AsFieldValue for u64 {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Int(*self)
    }
}

macro_rules! config_section {
    (@tag) => { None };
    (@tag $tag:literal) => { Some($tag) };
    (
        $(#[$meta:meta])*
        $ty:ident => $section:literal {
            $( $field:ident : $fty:ty $(=> $tag:literal)? = $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
        #[serde(default)]
        pub struct $ty {
            $( pub $field: $fty, )*
        }

        impl Default for $ty {
            fn default() -> Self {
                $ty {
                    $( $field: $default, )*
                }
            }
        }

        impl ConfigSection for $ty {
            const NAME: &'static str = $section;

            fn for_each_field<'a>(&'a self, visit: &mut dyn FnMut(Field<'a>)) {
                $(
                    visit(Field {
                        name: stringify!($field),
                        tag: config_section!(@tag $($tag)?),
                        value: self.$field.as_field_value(),
                    });
                )*
            }
        }
    };
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_threads() -> u64 {
    std::thread::available_parallelism()
        .map_or(1, |n| u64::try_from(n.get()).unwrap_or(1))
}

config_section! {
    /// Core settings of the tool itself.
    PleaseConfig => "please" {
        version: String => "PLZ_VERSION" = String::new(),
        lang: String = String::new(),
        num_threads: u64 = default_threads(),
        nonce: String = String::new(),
    }
}

config_section! {
    BuildConfig => "build" {
        path: Vec<String> => "BUILD_PATH" = strings(&["/usr/local/bin", "/usr/bin", "/bin"]),
        timeout: u64 = 600,
        config: String => "BUILD_CONFIG" = "opt".to_string(),
        lang: String = String::new(),
    }
}

config_section! {
    /// Settings that control how build files are found and parsed.
    ParseConfig => "parse" {
        build_file_names: Vec<String> => "BUILD_FILE_NAMES" = strings(&["BUILD"]),
        preload_build_defs: Vec<String> = Vec::new(),
        experimental_dirs: Vec<String> = Vec::new(),
    }
}

config_section! {
    GoConfig => "go" {
        go_tool: String => "GO_TOOL" = "go".to_string(),
        go_root: String => "GOROOT" = String::new(),
        test_tool: String => "GO_TEST_TOOL" = String::new(),
        go_path: String => "GOPATH" = "$TMP_DIR:$TMP_DIR/src:$TMP_DIR/$PKG_DIR:$TMP_DIR/third_party/go:$TMP_DIR/third_party/".to_string(),
        cgo_cc_tool: String => "CGO_CC_TOOL" = "gcc".to_string(),
    }
}

config_section! {
    PythonConfig => "python" {
        pip_tool: String => "PIP_TOOL" = "pip3".to_string(),
        pex_tool: String => "PEX_TOOL" = "please_pex".to_string(),
        default_interpreter: String => "DEFAULT_PYTHON_INTERPRETER" = "python3".to_string(),
        test_runner: String => "PYTHON_TEST_RUNNER" = "unittest".to_string(),
        module_dir: String => "PYTHON_MODULE_DIR" = String::new(),
        default_pip_repo: String => "PYTHON_DEFAULT_PIP_REPO" = String::new(),
        wheel_repo: String => "PYTHON_WHEEL_REPO" = String::new(),
        use_pypi: bool => "USE_PYPI" = true,
        wheel_name_scheme: String => "PYTHON_WHEEL_NAME_SCHEME" = String::new(),
    }
}

config_section! {
    JavaConfig => "java" {
        javac_tool: String => "JAVAC_TOOL" = "javac".to_string(),
        jar_tool: String => "JAR_TOOL" = "jar".to_string(),
        junit_runner: String => "JUNIT_RUNNER" = String::new(),
        default_test_package: String => "DEFAULT_TEST_PACKAGE" = String::new(),
        source_level: String => "JAVA_SOURCE_LEVEL" = "8".to_string(),
        target_level: String => "JAVA_TARGET_LEVEL" = "8".to_string(),
        javac_flags: String => "JAVAC_FLAGS" = String::new(),
        javac_test_flags: String => "JAVAC_TEST_FLAGS" = String::new(),
        default_maven_repo: String => "DEFAULT_MAVEN_REPO" = "https://repo1.maven.org/maven2".to_string(),
    }
}

config_section! {
    CppConfig => "cpp" {
        cc_tool: String => "CC_TOOL" = "gcc".to_string(),
        cpp_tool: String => "CPP_TOOL" = "g++".to_string(),
        ld_tool: String => "LD_TOOL" = "ld".to_string(),
        ar_tool: String => "AR_TOOL" = "ar".to_string(),
        default_opt_cflags: String => "DEFAULT_OPT_CFLAGS" = "--std=c99 -O3 -pipe -DNDEBUG -Wall -Werror".to_string(),
        default_dbg_cflags: String => "DEFAULT_DBG_CFLAGS" = "--std=c99 -g3 -pipe -DDEBUG -Wall -Werror".to_string(),
        default_ldflags: String => "DEFAULT_LDFLAGS" = "-lpthread -ldl".to_string(),
        coverage: bool => "CPP_COVERAGE" = true,
    }
}

config_section! {
    ProtoConfig => "proto" {
        protoc_tool: String => "PROTOC_TOOL" = "protoc".to_string(),
        protoc_go_plugin: String => "PROTOC_GO_PLUGIN" = "`which protoc-gen-go`".to_string(),
        grpc_python_plugin: String => "GRPC_PYTHON_PLUGIN" = String::new(),
        language: Vec<String> => "PROTO_LANGUAGES" = strings(&["cc", "py", "java", "go", "js"]),
        python_dep: String => "PROTO_PYTHON_DEP" = "//third_party/python:protobuf".to_string(),
        go_dep: String => "PROTO_GO_DEP" = "//third_party/go:protobuf".to_string(),
    }
}

config_section! {
    LicenceConfig => "licences" {
        accept: Vec<String> => "ACCEPTED_LICENCES" = Vec::new(),
        reject: Vec<String> = Vec::new(),
    }
}

/// Complete host configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub please: PleaseConfig,
    pub build: BuildConfig,
    pub parse: ParseConfig,
    pub go: GoConfig,
    pub python: PythonConfig,
    pub java: JavaConfig,
    pub cpp: CppConfig,
    pub proto: ProtoConfig,
    pub licences: LicenceConfig,
    /// Free-form settings, keyed as written in the config file.
    pub build_config: BTreeMap<String, String>,
}

impl Configuration {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Visit the fields of every section, sections in declaration order.
    pub fn for_each_field<'a>(&'a self, visit: &mut dyn FnMut(&'static str, Field<'a>)) {
        fn section<'a, S: ConfigSection>(
            s: &'a S,
            visit: &mut dyn FnMut(&'static str, Field<'a>),
        ) {
            s.for_each_field(&mut |field| visit(S::NAME, field));
        }
        section(&self.please, visit);
        section(&self.build, visit);
        section(&self.parse, visit);
        section(&self.go, visit);
        section(&self.python, visit);
        section(&self.java, visit);
        section(&self.cpp, visit);
        section(&self.proto, visit);
        section(&self.licences, visit);
    }

    /// Number of concurrent parse workers.
    pub fn num_workers(&self) -> usize {
        usize::try_from(self.please.num_threads).unwrap_or(usize::MAX)
    }
}
