//! Expression parsing with precedence climbing.
//!
//! Levels, loosest first: `lambda`, conditional, `or`, `and`, `not`,
//! comparisons and membership, `|`, `+ -`, `* // %`, unary `- +`, postfix.

use std::sync::Arc;

use sky_ir::ast::{
    Argument, BinaryOp, CompClause, Expr, ExprKind, FunctionDef, Stmt, StmtKind, UnaryOp,
};
use sky_ir::{ensure_sufficient_stack, Name};

use super::Parser;
use crate::{SyntaxError, TokenKind};

/// Binding power of prefix `not`.
const NOT_PRECEDENCE: u8 = 3;

impl Parser {
    /// Whether the current token can begin an expression.
    pub(super) fn starts_expr(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Int(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::None
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not
                | TokenKind::Lambda
        )
    }

    /// `test (',' test)* [',']`; more than one element makes a tuple.
    pub(super) fn parse_expr_list(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let first = self.parse_test()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if !self.starts_expr() {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), self.span_from(start)))
    }

    /// Loop variables: postfix expressions separated by commas.
    pub(super) fn parse_target_list(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let first = self.parse_postfix()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), self.span_from(start)))
    }

    /// A single expression, including conditionals and lambdas.
    pub(super) fn parse_test(&mut self) -> Result<Expr, SyntaxError> {
        ensure_sufficient_stack(|| {
            if self.check(&TokenKind::Lambda) {
                return self.parse_lambda();
            }
            let start = self.current_span();
            let then = self.parse_binary(1)?;
            if !self.eat(&TokenKind::If) {
                return Ok(then);
            }
            let cond = self.parse_binary(1)?;
            self.expect(&TokenKind::Else)?;
            let otherwise = self.parse_test()?;
            Ok(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                self.span_from(start),
            ))
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        self.advance();
        let params = self.parse_params(&TokenKind::Colon)?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_test()?;
        let span = self.span_from(start);
        let body_span = body.span;
        Ok(Expr::new(
            ExprKind::Lambda(Arc::new(FunctionDef {
                name: Name::intern("lambda"),
                params,
                body: vec![Stmt {
                    kind: StmtKind::Return(Some(body)),
                    span: body_span,
                }],
                span,
            })),
            span,
        ))
    }

    /// Binary operators binding at least as tightly as `min_prec`.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let mut left = if min_prec <= NOT_PRECEDENCE && self.check(&TokenKind::Not) {
            self.advance();
            let operand = self.parse_binary(NOT_PRECEDENCE)?;
            Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            )
        } else {
            self.parse_unary()?
        };

        loop {
            let (op, width) = match self.peek() {
                TokenKind::Or => (BinaryOp::Or, 1),
                TokenKind::And => (BinaryOp::And, 1),
                TokenKind::EqEq => (BinaryOp::Eq, 1),
                TokenKind::NotEq => (BinaryOp::NotEq, 1),
                TokenKind::Lt => (BinaryOp::Lt, 1),
                TokenKind::LtEq => (BinaryOp::LtEq, 1),
                TokenKind::Gt => (BinaryOp::Gt, 1),
                TokenKind::GtEq => (BinaryOp::GtEq, 1),
                TokenKind::In => (BinaryOp::In, 1),
                TokenKind::Not if *self.peek_at(1) == TokenKind::In => (BinaryOp::NotIn, 2),
                TokenKind::Pipe => (BinaryOp::BitOr, 1),
                TokenKind::Plus => (BinaryOp::Add, 1),
                TokenKind::Minus => (BinaryOp::Sub, 1),
                TokenKind::Star => (BinaryOp::Mul, 1),
                TokenKind::SlashSlash => (BinaryOp::FloorDiv, 1),
                TokenKind::Percent => (BinaryOp::Mod, 1),
                TokenKind::Slash => {
                    return Err(SyntaxError::new(
                        "`/` is not supported, use `//` for integer division",
                        self.current_span(),
                    ));
                }
                _ => break,
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            for _ in 0..width {
                self.advance();
            }
            let right = self.parse_binary(prec + 1)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    /// Primary followed by `.attr`, `[index]`, `[a:b]` and `(args)`.
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_ident()?;
                    expr = Expr::new(
                        ExprKind::Attr {
                            receiver: Box::new(expr),
                            attr,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr, start)?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_subscript(&mut self, receiver: Expr, start: sky_ir::Span) -> Result<Expr, SyntaxError> {
        let first = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_test()?)
        };
        let kind = if self.eat(&TokenKind::Colon) {
            let end = if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_test()?))
            };
            ExprKind::Slice {
                receiver: Box::new(receiver),
                start: first.map(Box::new),
                end,
            }
        } else {
            let Some(index) = first else {
                return Err(self.unexpected("index expression"));
            };
            ExprKind::Index {
                receiver: Box::new(receiver),
                index: Box::new(index),
            }
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(kind, self.span_from(start)))
    }

    fn parse_call_args(&mut self) -> Result<Vec<Argument>, SyntaxError> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let arg = match self.peek() {
                TokenKind::Star => {
                    self.advance();
                    Argument::Star(self.parse_test()?)
                }
                TokenKind::StarStar => {
                    self.advance();
                    Argument::StarStar(self.parse_test()?)
                }
                TokenKind::Ident(name) if *self.peek_at(1) == TokenKind::Eq => {
                    let name = *name;
                    self.advance();
                    self.advance();
                    Argument::Named(name, self.parse_test()?)
                }
                _ => Argument::Positional(self.parse_test()?),
            };
            args.push(arg);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let kind = match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Str(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::None => {
                self.advance();
                ExprKind::None
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::LParen => {
                self.advance();
                return self.parse_paren(start);
            }
            TokenKind::LBracket => {
                self.advance();
                return self.parse_list(start);
            }
            TokenKind::LBrace => {
                self.advance();
                return self.parse_dict(start);
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// `()`, `(x)` or `(x, y)`.
    fn parse_paren(&mut self, start: sky_ir::Span) -> Result<Expr, SyntaxError> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_test()?;
        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::new(ExprKind::Tuple(items), self.span_from(start)))
    }

    /// `[...]` list display or comprehension.
    fn parse_list(&mut self, start: sky_ir::Span) -> Result<Expr, SyntaxError> {
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_test()?;
        if self.check(&TokenKind::For) {
            let clauses = self.parse_comp_clauses()?;
            self.expect(&TokenKind::RBracket)?;
            return Ok(Expr::new(
                ExprKind::ListComp {
                    element: Box::new(first),
                    clauses,
                },
                self.span_from(start),
            ));
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::List(items), self.span_from(start)))
    }

    fn parse_comp_clauses(&mut self) -> Result<Vec<CompClause>, SyntaxError> {
        let mut clauses = Vec::new();
        loop {
            match self.peek() {
                TokenKind::For => {
                    self.advance();
                    let target = self.parse_target_list()?;
                    self.expect(&TokenKind::In)?;
                    let iter = self.parse_binary(1)?;
                    clauses.push(CompClause::For { target, iter });
                }
                TokenKind::If => {
                    self.advance();
                    clauses.push(CompClause::If(self.parse_binary(1)?));
                }
                _ => return Ok(clauses),
            }
        }
    }

    fn parse_dict(&mut self, start: sky_ir::Span) -> Result<Expr, SyntaxError> {
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key = self.parse_test()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_test()?;
            entries.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Dict(entries), self.span_from(start)))
    }
}
