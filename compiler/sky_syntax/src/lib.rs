//! Lexer and parser for build description files and rule definitions.
//!
//! The language is a Python-like configuration dialect: `def`, `if`, `for`,
//! list comprehensions, `lambda` and `load()`, with no classes, `while`,
//! exceptions or floating point.

mod error;
mod lexer;
mod parser;
mod token;

pub use error::SyntaxError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

use sky_ir::ast::Module;

/// Lex and parse a complete source file.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_module()
}
