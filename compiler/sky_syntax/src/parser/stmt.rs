//! Statement parsing.

use std::sync::Arc;

use sky_ir::ast::{
    BinaryOp, Expr, ExprKind, FunctionDef, LoadSymbol, Param, ParamKind, Stmt, StmtKind,
};
use sky_ir::Name;

use super::Parser;
use crate::{SyntaxError, TokenKind};

impl Parser {
    /// Statements up to (not including) `end`.
    pub(super) fn parse_block_until(&mut self, end: &TokenKind) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(&TokenKind::Newline) {}
            if self.check(end) {
                return Ok(stmts);
            }
            self.parse_stmt(&mut stmts)?;
        }
    }

    fn parse_stmt(&mut self, out: &mut Vec<Stmt>) -> Result<(), SyntaxError> {
        match self.peek() {
            TokenKind::Def => out.push(self.parse_def()?),
            TokenKind::If => out.push(self.parse_if()?),
            TokenKind::For => out.push(self.parse_for()?),
            TokenKind::Indent => return Err(self.unexpected("statement")),
            _ => self.parse_simple_line(out)?,
        }
        Ok(())
    }

    /// `small_stmt (';' small_stmt)* [';'] NEWLINE`
    fn parse_simple_line(&mut self, out: &mut Vec<Stmt>) -> Result<(), SyntaxError> {
        loop {
            out.push(self.parse_small_stmt()?);
            if !self.eat(&TokenKind::Semicolon) || self.check(&TokenKind::Newline) {
                break;
            }
        }
        self.expect(&TokenKind::Newline)?;
        Ok(())
    }

    fn parse_small_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_span();
        let kind = match self.peek() {
            TokenKind::Return => {
                self.advance();
                if self.starts_expr() {
                    StmtKind::Return(Some(self.parse_expr_list()?))
                } else {
                    StmtKind::Return(None)
                }
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Ident(name)
                if name.as_str() == "load" && *self.peek_at(1) == TokenKind::LParen =>
            {
                self.parse_load()?
            }
            _ => self.parse_expr_or_assign()?,
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_expr_or_assign(&mut self) -> Result<StmtKind, SyntaxError> {
        let expr = self.parse_expr_list()?;
        if self.eat(&TokenKind::Eq) {
            check_assign_target(&expr, true)?;
            let value = self.parse_expr_list()?;
            return Ok(StmtKind::Assign {
                target: expr,
                value,
            });
        }
        let op = match self.peek() {
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mul,
            TokenKind::PipeEq => BinaryOp::BitOr,
            _ => return Ok(StmtKind::Expr(expr)),
        };
        self.advance();
        check_assign_target(&expr, false)?;
        let value = self.parse_expr_list()?;
        Ok(StmtKind::AugAssign {
            target: expr,
            op,
            value,
        })
    }

    /// `load("module", "a", b = "c")`
    fn parse_load(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        self.expect(&TokenKind::LParen)?;
        let TokenKind::Str(module) = self.peek().clone() else {
            return Err(self.unexpected("module name string"));
        };
        self.advance();

        let mut symbols = Vec::new();
        while self.eat(&TokenKind::Comma) {
            match self.peek().clone() {
                TokenKind::RParen => break,
                TokenKind::Str(name) => {
                    self.advance();
                    let name = Name::intern(&name);
                    symbols.push(LoadSymbol {
                        local: name,
                        remote: name,
                    });
                }
                TokenKind::Ident(local) => {
                    self.advance();
                    self.expect(&TokenKind::Eq)?;
                    let TokenKind::Str(remote) = self.peek().clone() else {
                        return Err(self.unexpected("symbol name string"));
                    };
                    self.advance();
                    symbols.push(LoadSymbol {
                        local,
                        remote: Name::intern(&remote),
                    });
                }
                _ => return Err(self.unexpected("symbol name")),
            }
        }
        self.expect(&TokenKind::RParen)?;
        if symbols.is_empty() {
            return Err(SyntaxError::new(
                "load statement must import at least one symbol",
                self.prev_span,
            ));
        }
        Ok(StmtKind::Load { module, symbols })
    }

    /// A block after `:`, either inline or indented.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(&TokenKind::Colon)?;
        if !self.eat(&TokenKind::Newline) {
            let mut stmts = Vec::new();
            self.parse_simple_line(&mut stmts)?;
            return Ok(stmts);
        }
        while self.eat(&TokenKind::Newline) {}
        self.expect(&TokenKind::Indent)?;
        let stmts = self.parse_block_until(&TokenKind::Dedent)?;
        self.expect(&TokenKind::Dedent)?;
        Ok(stmts)
    }

    fn parse_def(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_span();
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params(&TokenKind::RParen)?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_suite()?;
        let span = self.span_from(start);
        Ok(Stmt {
            kind: StmtKind::Def(Arc::new(FunctionDef {
                name,
                params,
                body,
                span,
            })),
            span,
        })
    }

    /// Parameter list up to (not including) `end`.
    pub(super) fn parse_params(&mut self, end: &TokenKind) -> Result<Vec<Param>, SyntaxError> {
        let mut params: Vec<Param> = Vec::new();
        let mut seen_optional = false;
        while !self.check(end) {
            let start = self.current_span();
            let kind = if self.eat(&TokenKind::Star) {
                ParamKind::Args
            } else if self.eat(&TokenKind::StarStar) {
                ParamKind::Kwargs
            } else {
                ParamKind::Required
            };
            let name = self.expect_ident()?;
            let kind = if matches!(kind, ParamKind::Required) && self.eat(&TokenKind::Eq) {
                seen_optional = true;
                ParamKind::Optional(self.parse_test()?)
            } else {
                kind
            };
            if matches!(kind, ParamKind::Required) && seen_optional {
                return Err(SyntaxError::new(
                    "required parameter follows optional parameter",
                    self.span_from(start),
                ));
            }
            if params.iter().any(|p| p.name == name) {
                return Err(SyntaxError::new(
                    format!("duplicate parameter `{name}`"),
                    self.span_from(start),
                ));
            }
            params.push(Param {
                name,
                kind,
                span: self.span_from(start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// `if`/`elif` chain. An `elif` becomes a nested `if` in the else branch.
    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_span();
        self.advance();
        let cond = self.parse_test()?;
        let then_branch = self.parse_suite()?;
        let else_branch = match self.peek() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.advance();
                self.parse_suite()?
            }
            _ => Vec::new(),
        };
        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_span();
        self.advance();
        let target = self.parse_target_list()?;
        check_assign_target(&target, true)?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_expr_list()?;
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::For { target, iter, body },
            span: self.span_from(start),
        })
    }
}

/// Only names, attributes and index expressions can be assigned; tuples and
/// lists of those can be unpacked unless `unpack` is false.
fn check_assign_target(expr: &Expr, unpack: bool) -> Result<(), SyntaxError> {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::Attr { .. } | ExprKind::Index { .. } => Ok(()),
        ExprKind::Tuple(items) | ExprKind::List(items) if unpack => items
            .iter()
            .try_for_each(|item| check_assign_target(item, true)),
        _ => Err(SyntaxError::new("cannot assign to this expression", expr.span)),
    }
}
