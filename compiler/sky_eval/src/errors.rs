//! Evaluation errors.
//!
//! `EvalErrorKind` is the typed category; factory functions below are the
//! public way to build errors so message wording stays in one place.
//! The evaluator attaches a source location and the chain of function
//! names as an error unwinds.

use std::fmt;

use sky_ir::{Location, Name};
use thiserror::Error;

/// Typed error category.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Source
    #[error("syntax error: {message}")]
    Syntax { message: String },

    // Names and attributes
    #[error("name '{name}' is not defined")]
    UndefinedName { name: String },
    #[error("'{type_name}' value has no attribute '{attr}'")]
    NoAttribute { type_name: String, attr: String },

    // Types and operators
    #[error("{context}: expected {expected}, got {got}")]
    TypeMismatch {
        context: String,
        expected: String,
        got: String,
    },
    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("unsupported operand type for {op}: '{operand}'")]
    UnsupportedUnary { op: &'static str, operand: String },
    #[error("'{type_name}' value is not callable")]
    NotCallable { type_name: String },
    #[error("'{type_name}' value is not iterable")]
    NotIterable { type_name: String },
    #[error("unhashable type: '{type_name}'")]
    Unhashable { type_name: String },

    // Calls
    #[error("{function}: {message}")]
    Argument { function: String, message: String },
    #[error("function {name} called recursively")]
    Recursion { name: String },

    // Arithmetic
    #[error("integer division by zero")]
    DivisionByZero,
    #[error("integer overflow in {op}")]
    Overflow { op: &'static str },

    // Containers
    #[error("index {index} out of range for {type_name} of length {len}")]
    Index {
        type_name: &'static str,
        index: i64,
        len: usize,
    },
    #[error("key {key} not in dict")]
    Key { key: String },
    #[error("cannot mutate frozen {type_name}")]
    Frozen { type_name: String },
    #[error("{message}")]
    Value { message: String },

    // Modules
    #[error("cannot load '{module}': {message}")]
    Load { module: String, message: String },

    // Host-raised
    #[error("{message}")]
    Fail { message: String },
    #[error("{message}")]
    Fatal { message: String },
    #[error("invariant violation: {message}")]
    Invariant { message: String },
    #[error("{message}")]
    Host { message: String },
}

/// Evaluation error with location and call chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Where the error was raised, if known.
    pub location: Option<Location>,
    /// Function names from innermost to outermost.
    pub call_stack: Vec<Name>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            location: None,
            call_stack: Vec::new(),
        }
    }

    /// Attach `location` unless a more precise one is already set.
    #[must_use]
    pub fn at(mut self, location: impl FnOnce() -> Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location());
        }
        self
    }

    pub(crate) fn push_frame(&mut self, name: Name) {
        self.call_stack.push(name);
    }

    /// Raised by `log.fatal`; never handled per file.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Fatal { .. })
    }

    /// Raised when a builtin runs without the context it needs.
    pub fn is_invariant(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Invariant { .. })
    }

    /// The message without location or call stack.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.kind)?;
        if !self.call_stack.is_empty() {
            write!(f, " (in ")?;
            for (i, name) in self.call_stack.iter().enumerate() {
                if i > 0 {
                    write!(f, " <- ")?;
                }
                write!(f, "{name}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::new(kind)
    }
}

// Factory functions

#[cold]
pub fn syntax_error(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Syntax {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn undefined_name(name: Name) -> EvalError {
    EvalErrorKind::UndefinedName {
        name: name.as_str().to_string(),
    }
    .into()
}

#[cold]
pub fn no_attribute(type_name: &str, attr: &str) -> EvalError {
    EvalErrorKind::NoAttribute {
        type_name: type_name.to_string(),
        attr: attr.to_string(),
    }
    .into()
}

#[cold]
pub fn wrong_type(context: &str, expected: &str, got: &str) -> EvalError {
    EvalErrorKind::TypeMismatch {
        context: context.to_string(),
        expected: expected.to_string(),
        got: got.to_string(),
    }
    .into()
}

#[cold]
pub fn unsupported_operands(op: &'static str, left: &str, right: &str) -> EvalError {
    EvalErrorKind::UnsupportedOperands {
        op,
        left: left.to_string(),
        right: right.to_string(),
    }
    .into()
}

#[cold]
pub fn unsupported_unary(op: &'static str, operand: &str) -> EvalError {
    EvalErrorKind::UnsupportedUnary {
        op,
        operand: operand.to_string(),
    }
    .into()
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    }
    .into()
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    EvalErrorKind::NotIterable {
        type_name: type_name.to_string(),
    }
    .into()
}

#[cold]
pub fn unhashable(type_name: &str) -> EvalError {
    EvalErrorKind::Unhashable {
        type_name: type_name.to_string(),
    }
    .into()
}

#[cold]
pub fn argument_error(function: &str, message: impl Into<String>) -> EvalError {
    EvalErrorKind::Argument {
        function: function.to_string(),
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn recursion(name: Name) -> EvalError {
    EvalErrorKind::Recursion {
        name: name.as_str().to_string(),
    }
    .into()
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalErrorKind::DivisionByZero.into()
}

#[cold]
pub fn overflow(op: &'static str) -> EvalError {
    EvalErrorKind::Overflow { op }.into()
}

#[cold]
pub fn index_out_of_range(type_name: &'static str, index: i64, len: usize) -> EvalError {
    EvalErrorKind::Index {
        type_name,
        index,
        len,
    }
    .into()
}

#[cold]
pub fn key_not_found(key: String) -> EvalError {
    EvalErrorKind::Key { key }.into()
}

#[cold]
pub fn frozen(type_name: &str) -> EvalError {
    EvalErrorKind::Frozen {
        type_name: type_name.to_string(),
    }
    .into()
}

#[cold]
pub fn value_error(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Value {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn load_error(module: &str, message: impl Into<String>) -> EvalError {
    EvalErrorKind::Load {
        module: module.to_string(),
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn fail(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Fail {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn fatal(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Fatal {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn invariant(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Invariant {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn host_error(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Host {
        message: message.into(),
    }
    .into()
}
