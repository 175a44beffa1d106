//! Expression evaluation.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sky_ir::ast::{Argument, BinaryOp, CompClause, Expr, ExprKind, UnaryOp};
use sky_ir::ensure_sufficient_stack;

use super::{call, ops, Env, Eval};
use crate::errors::{argument_error, wrong_type, EvalError};
use crate::value::Dict;
use crate::{Arguments, Value};

impl Eval<'_> {
    pub(super) fn eval_expr(&mut self, env: &mut Env, expr: &Expr) -> Result<Value, EvalError> {
        ensure_sufficient_stack(|| self.eval_expr_inner(env, expr))
    }

    fn eval_expr_inner(&mut self, env: &mut Env, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::None => Ok(Value::None),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Str(s) => Ok(Value::Str(Arc::clone(s))),
            ExprKind::Ident(name) => env
                .lookup(*name)
                .map_err(|e| e.at(|| env.module.location(expr.span))),
            ExprKind::List(items) => Ok(Value::list(self.eval_all(env, items)?)),
            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_all(env, items)?)),
            ExprKind::Dict(entries) => {
                let dict = Dict::new();
                for (k, v) in entries {
                    let key = self.eval_expr(env, k)?;
                    let value = self.eval_expr(env, v)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::Dict(Arc::new(dict)))
            }
            ExprKind::Attr { receiver, attr } => {
                let receiver = self.eval_expr(env, receiver)?;
                ops::get_attr(&receiver, *attr)
            }
            ExprKind::Index { receiver, index } => {
                let receiver = self.eval_expr(env, receiver)?;
                let index = self.eval_expr(env, index)?;
                ops::index(&receiver, &index)
            }
            ExprKind::Slice {
                receiver,
                start,
                end,
            } => {
                let receiver = self.eval_expr(env, receiver)?;
                let start = self.eval_bound(env, start.as_deref())?;
                let end = self.eval_bound(env, end.as_deref())?;
                ops::slice(&receiver, start, end)
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(env, callee)?;
                let args = self.eval_args(env, args)?;
                call(self.thread, &callee, args).map_err(|e| e.at(|| env.module.location(expr.span)))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(env, operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truth())),
                    UnaryOp::Neg | UnaryOp::Plus => ops::unary(*op, &value),
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(env, left)?;
                match op {
                    BinaryOp::And if !left.truth() => Ok(left),
                    BinaryOp::Or if left.truth() => Ok(left),
                    BinaryOp::And | BinaryOp::Or => self.eval_expr(env, right),
                    _ => {
                        let right = self.eval_expr(env, right)?;
                        ops::binary(*op, &left, &right)
                    }
                }
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(env, cond)?.truth() {
                    self.eval_expr(env, then)
                } else {
                    self.eval_expr(env, otherwise)
                }
            }
            ExprKind::ListComp { element, clauses } => {
                env.scopes.push(FxHashMap::default());
                let mut out = Vec::new();
                let result = self.comprehension(env, element, clauses, &mut out);
                env.scopes.pop();
                result.map(|()| Value::list(out))
            }
            ExprKind::Lambda(def) => self.make_function(env, def),
        }
    }

    fn eval_all(&mut self, env: &mut Env, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval_expr(env, e)).collect()
    }

    fn eval_bound(&mut self, env: &mut Env, bound: Option<&Expr>) -> Result<Option<i64>, EvalError> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.eval_expr(env, expr)? {
            Value::Int(n) => Ok(Some(n)),
            Value::None => Ok(None),
            other => Err(wrong_type("slice index", "int", other.type_name())),
        }
    }

    fn eval_args(&mut self, env: &mut Env, args: &[Argument]) -> Result<Arguments, EvalError> {
        let mut out = Arguments::default();
        for arg in args {
            match arg {
                Argument::Positional(e) => out.positional.push(self.eval_expr(env, e)?),
                Argument::Named(name, e) => {
                    let value = self.eval_expr(env, e)?;
                    out.named.push((*name, value));
                }
                Argument::Star(e) => {
                    let value = self.eval_expr(env, e)?;
                    out.positional.extend(value.iterate()?);
                }
                Argument::StarStar(e) => match self.eval_expr(env, e)? {
                    Value::Dict(dict) => {
                        for (k, v) in dict.items() {
                            let Value::Str(key) = k else {
                                return Err(argument_error(
                                    "**kwargs",
                                    "keywords must be strings",
                                ));
                            };
                            out.named.push((sky_ir::Name::intern(&key), v));
                        }
                    }
                    other => return Err(wrong_type("**kwargs", "dict", other.type_name())),
                },
            }
        }
        Ok(out)
    }

    fn comprehension(
        &mut self,
        env: &mut Env,
        element: &Expr,
        clauses: &[CompClause],
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let Some((clause, rest)) = clauses.split_first() else {
            out.push(self.eval_expr(env, element)?);
            return Ok(());
        };
        match clause {
            CompClause::For { target, iter } => {
                for item in self.eval_expr(env, iter)?.iterate()? {
                    self.assign(env, target, item)?;
                    self.comprehension(env, element, rest, out)?;
                }
            }
            CompClause::If(cond) => {
                if self.eval_expr(env, cond)?.truth() {
                    self.comprehension(env, element, rest, out)?;
                }
            }
        }
        Ok(())
    }
}
