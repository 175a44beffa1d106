//! Syntax errors reported by the lexer and parser.

use sky_ir::Span;
use thiserror::Error;

/// A lexing or parsing failure. Parsing stops at the first error.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        SyntaxError {
            message: message.into(),
            span,
        }
    }
}
