//! Recursive descent parser.
//!
//! Statements live in `stmt.rs`, expressions in `expr.rs`. This file holds
//! the cursor over the token stream shared by both.

mod expr;
mod stmt;

use sky_ir::ast::Module;
use sky_ir::{Name, Span};

use crate::{SyntaxError, Token, TokenKind};

/// Parser state over a lexed token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Span of the most recently consumed token.
    prev_span: Span,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            prev_span: Span::DUMMY,
        }
    }

    /// Parse a whole file.
    pub fn parse_module(&mut self) -> Result<Module, SyntaxError> {
        let stmts = self.parse_block_until(&TokenKind::Eof)?;
        Ok(Module { stmts })
    }

    // === Cursor ===

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::DUMMY, |t| t.span)
    }

    fn advance(&mut self) -> TokenKind {
        let Some(token) = self.tokens.get(self.pos) else {
            return TokenKind::Eof;
        };
        self.prev_span = token.span;
        let kind = token.kind.clone();
        if kind != TokenKind::Eof {
            self.pos += 1;
        }
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, SyntaxError> {
        if self.check(kind) {
            self.advance();
            Ok(self.prev_span)
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<Name, SyntaxError> {
        if let TokenKind::Ident(name) = *self.peek() {
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.prev_span)
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::new(
            format!("expected {expected}, found {}", self.peek().describe()),
            self.current_span(),
        )
    }
}
