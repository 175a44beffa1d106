//! Lexer using logos, plus the indentation pass.
//!
//! Logos produces raw tokens with horizontal whitespace, comments and line
//! continuations skipped. The second pass turns line structure into
//! `Newline`/`Indent`/`Dedent` tokens:
//! - newlines inside `()`, `[]` and `{}` are ignored
//! - blank and comment-only lines produce nothing
//! - tabs advance to the next multiple of 8 columns

use logos::Logos;
use sky_ir::{Name, Span};
use std::sync::Arc;

use crate::{SyntaxError, Token, TokenKind};

/// Raw token from logos (before layout processing).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
enum RawToken {
    #[regex(r"#[^\n]*", logos::skip)]
    #[regex(r"\\\r?\n", logos::skip)]
    Comment,

    #[token("\n")]
    Newline,

    // === Keywords ===
    #[token("and")]
    And,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("def")]
    Def,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("False")]
    False,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("lambda")]
    Lambda,
    #[token("None")]
    None,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("pass")]
    Pass,
    #[token("return")]
    Return,
    #[token("True")]
    True,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // === Operators ===
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("|=")]
    PipeEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("|")]
    Pipe,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""""([^"\\]|\\.|"([^"\\]|\\.)|""([^"\\]|\\.))*""""#)]
    #[regex(r"'''([^'\\]|\\.|'([^'\\]|\\.)|''([^'\\]|\\.))*'''")]
    TripleQuoted,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Quoted,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl RawToken {
    fn cook(self, slice: &str) -> TokenKind {
        match self {
            RawToken::Int(n) => TokenKind::Int(n),
            RawToken::TripleQuoted => {
                TokenKind::Str(Arc::from(unescape(&slice[3..slice.len() - 3])))
            }
            RawToken::Quoted => TokenKind::Str(Arc::from(unescape(&slice[1..slice.len() - 1]))),
            RawToken::Ident => TokenKind::Ident(Name::intern(slice)),

            RawToken::And => TokenKind::And,
            RawToken::Break => TokenKind::Break,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Def => TokenKind::Def,
            RawToken::Elif => TokenKind::Elif,
            RawToken::Else => TokenKind::Else,
            RawToken::False => TokenKind::False,
            RawToken::For => TokenKind::For,
            RawToken::If => TokenKind::If,
            RawToken::In => TokenKind::In,
            RawToken::Lambda => TokenKind::Lambda,
            RawToken::None => TokenKind::None,
            RawToken::Not => TokenKind::Not,
            RawToken::Or => TokenKind::Or,
            RawToken::Pass => TokenKind::Pass,
            RawToken::Return => TokenKind::Return,
            RawToken::True => TokenKind::True,

            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Dot => TokenKind::Dot,

            RawToken::Eq => TokenKind::Eq,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::StarStar => TokenKind::StarStar,
            RawToken::Slash => TokenKind::Slash,
            RawToken::SlashSlash => TokenKind::SlashSlash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Pipe => TokenKind::Pipe,

            // Skipped by logos or handled by the layout pass.
            RawToken::Comment | RawToken::Newline => TokenKind::Newline,
        }
    }
}

/// Lexer producing layout-aware tokens.
pub struct Lexer<'src> {
    source: &'src str,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer { source }
    }

    /// Lex the whole source, ending with `Newline`, any pending `Dedent`s and `Eof`.
    pub fn tokenize(&self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        let mut indents: Vec<u32> = vec![0];
        let mut depth: u32 = 0;
        let mut at_line_start = true;
        let mut raw = RawToken::lexer(self.source);

        while let Some(result) = raw.next() {
            let range = raw.span();
            let span = Span::from_range(range.clone());
            let slice = raw.slice();
            let Ok(token) = result else {
                return Err(invalid_token(slice, span));
            };

            if token == RawToken::Newline {
                if depth == 0 && !at_line_start {
                    tokens.push(Token::new(TokenKind::Newline, span));
                    at_line_start = true;
                }
                continue;
            }

            if at_line_start && depth == 0 {
                let column = self.indentation(range.start);
                push_layout(column, span, &mut indents, &mut tokens)?;
                at_line_start = false;
            }

            match token {
                RawToken::LParen | RawToken::LBracket | RawToken::LBrace => depth += 1,
                RawToken::RParen | RawToken::RBracket | RawToken::RBrace => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            tokens.push(Token::new(token.cook(slice), span));
        }

        let end = Span::point(u32::try_from(self.source.len()).unwrap_or(u32::MAX));
        if !at_line_start {
            tokens.push(Token::new(TokenKind::Newline, end));
        }
        while indents.len() > 1 {
            indents.pop();
            tokens.push(Token::new(TokenKind::Dedent, end));
        }
        tokens.push(Token::new(TokenKind::Eof, end));
        tracing::trace!(count = tokens.len(), "lexed");
        Ok(tokens)
    }

    /// Width of the whitespace between the previous newline and `offset`.
    fn indentation(&self, offset: usize) -> u32 {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |nl| nl + 1);
        self.source[line_start..offset]
            .chars()
            .fold(0u32, |col, c| match c {
                '\t' => (col / 8 + 1) * 8,
                ' ' => col + 1,
                _ => col,
            })
    }
}

fn push_layout(
    column: u32,
    span: Span,
    indents: &mut Vec<u32>,
    tokens: &mut Vec<Token>,
) -> Result<(), SyntaxError> {
    let current = indents.last().copied().unwrap_or(0);
    if column > current {
        indents.push(column);
        tokens.push(Token::new(TokenKind::Indent, span));
        return Ok(());
    }
    while column < indents.last().copied().unwrap_or(0) {
        indents.pop();
        tokens.push(Token::new(TokenKind::Dedent, span));
    }
    if column == indents.last().copied().unwrap_or(0) {
        Ok(())
    } else {
        Err(SyntaxError::new(
            "unindent does not match any outer indentation level",
            span,
        ))
    }
}

fn invalid_token(slice: &str, span: Span) -> SyntaxError {
    if slice.starts_with('"') || slice.starts_with('\'') {
        SyntaxError::new("unterminated string literal", span)
    } else {
        SyntaxError::new(format!("invalid token `{slice}`"), span)
    }
}

/// Process string escape sequences.
fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\n') => {}
            Some(other) => {
                // Unknown escape - keep as-is
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
