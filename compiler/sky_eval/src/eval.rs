//! Tree-walking evaluator.
//!
//! `Eval` borrows the thread for the duration of one module or call.
//! Statements are executed here; expressions, calls and operators live in
//! the submodules.

mod call;
mod expr;
mod ops;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sky_ir::ast::{BinaryOp, Expr, ExprKind, FunctionDef, ParamKind, Stmt, StmtKind};
use sky_ir::Name;

use crate::errors::{invariant, load_error, undefined_name, value_error, EvalError};
use crate::module::ModuleScope;
use crate::value::Function;
use crate::{Thread, Value};

pub use call::call;
pub(crate) use ops::{get_attr, has_attr};

/// How a statement finished.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Name resolution for the code being executed.
struct Env {
    module: Arc<ModuleScope>,
    /// Enclosing-function locals captured when a nested function was defined.
    captured: Arc<FxHashMap<Name, Value>>,
    /// Innermost last. Empty at module top level, where assignments go to
    /// the module; a function call starts with its locals, and each
    /// comprehension pushes its own scope.
    scopes: Vec<FxHashMap<Name, Value>>,
}

impl Env {
    fn module_level(module: Arc<ModuleScope>) -> Self {
        Env {
            module,
            captured: Arc::default(),
            scopes: Vec::new(),
        }
    }

    fn function(function: &Function, locals: FxHashMap<Name, Value>) -> Result<Self, EvalError> {
        let Some(module) = function.module.upgrade() else {
            return Err(invariant(format!(
                "function {} outlived the module that defined it",
                function.name()
            )));
        };
        Ok(Env {
            module,
            captured: Arc::clone(&function.captured),
            scopes: vec![locals],
        })
    }

    fn lookup(&self, name: Name) -> Result<Value, EvalError> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(&name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.captured.get(&name) {
            return Ok(value.clone());
        }
        self.module.lookup(name).ok_or_else(|| undefined_name(name))
    }

    fn assign(&mut self, name: Name, value: Value) -> Result<(), EvalError> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name, value);
                Ok(())
            }
            None => self.module.define(name, value),
        }
    }

    /// Locals visible to a function defined at this point.
    fn capture(&self) -> Arc<FxHashMap<Name, Value>> {
        if self.scopes.is_empty() {
            return Arc::clone(&self.captured);
        }
        let mut captured = (*self.captured).clone();
        for scope in &self.scopes {
            captured.extend(scope.iter().map(|(k, v)| (*k, v.clone())));
        }
        Arc::new(captured)
    }
}

pub(crate) struct Eval<'t> {
    thread: &'t mut Thread,
}

impl<'t> Eval<'t> {
    pub(crate) fn new(thread: &'t mut Thread) -> Self {
        Eval { thread }
    }

    pub(crate) fn exec_module(
        &mut self,
        module: &Arc<ModuleScope>,
        stmts: &[Stmt],
    ) -> Result<(), EvalError> {
        let mut env = Env::module_level(Arc::clone(module));
        for stmt in stmts {
            match self.exec_stmt(&mut env, stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => {
                    return Err(value_error("return statement outside function")
                        .at(|| module.location(stmt.span)));
                }
                Flow::Break | Flow::Continue => {
                    return Err(value_error("break or continue outside loop")
                        .at(|| module.location(stmt.span)));
                }
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, env: &mut Env, stmts: &[Stmt]) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.exec_stmt(env, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, env: &mut Env, stmt: &Stmt) -> Result<Flow, EvalError> {
        self.exec_stmt_inner(env, stmt)
            .map_err(|e| e.at(|| env.module.location(stmt.span)))
    }

    fn exec_stmt_inner(&mut self, env: &mut Env, stmt: &Stmt) -> Result<Flow, EvalError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(env, expr)?;
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(env, value)?;
                self.assign(env, target, value)?;
            }
            StmtKind::AugAssign { target, op, value } => {
                let current = self.eval_expr(env, target)?;
                let rhs = self.eval_expr(env, value)?;
                let result = match (&current, op) {
                    // `+=` extends a list in place.
                    (Value::List(list), BinaryOp::Add) => {
                        let extra = rhs.iterate()?;
                        list.mutate(|items| items.extend(extra))?;
                        current.clone()
                    }
                    _ => ops::binary(*op, &current, &rhs)?,
                };
                self.assign(env, target, result)?;
            }
            StmtKind::Def(def) => {
                let function = self.make_function(env, def)?;
                env.assign(def.name, function)?;
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.eval_expr(env, cond)?.truth() {
                    then_branch
                } else {
                    else_branch
                };
                return self.exec_block(env, branch);
            }
            StmtKind::For { target, iter, body } => {
                for item in self.eval_expr(env, iter)?.iterate()? {
                    self.assign(env, target, item)?;
                    match self.exec_block(env, body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(env, expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Pass => {}
            StmtKind::Load { module, symbols } => {
                let bindings = self.thread.load(module)?;
                env.module.retain(&bindings);
                for symbol in symbols {
                    if symbol.remote.as_str().starts_with('_') {
                        return Err(load_error(
                            module,
                            format!("symbol '{}' is private", symbol.remote),
                        ));
                    }
                    let Some(value) = bindings.get_name(symbol.remote) else {
                        return Err(load_error(
                            module,
                            format!("symbol '{}' not found", symbol.remote),
                        ));
                    };
                    env.assign(symbol.local, value.clone())?;
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluate defaults now and capture the enclosing locals.
    fn make_function(&mut self, env: &mut Env, def: &Arc<FunctionDef>) -> Result<Value, EvalError> {
        let mut defaults = Vec::with_capacity(def.params.len());
        for param in &def.params {
            defaults.push(match &param.kind {
                ParamKind::Optional(expr) => Some(self.eval_expr(env, expr)?),
                ParamKind::Required | ParamKind::Args | ParamKind::Kwargs => None,
            });
        }
        Ok(Value::Function(Arc::new(Function {
            def: Arc::clone(def),
            module: Arc::downgrade(&env.module),
            defaults,
            captured: env.capture(),
        })))
    }

    fn assign(&mut self, env: &mut Env, target: &Expr, value: Value) -> Result<(), EvalError> {
        match &target.kind {
            ExprKind::Ident(name) => env.assign(*name, value),
            ExprKind::Index { receiver, index } => {
                let receiver = self.eval_expr(env, receiver)?;
                let index = self.eval_expr(env, index)?;
                ops::set_index(&receiver, index, value)
            }
            ExprKind::Attr { attr, .. } => Err(value_error(format!(
                "cannot assign to field '{attr}': struct values are immutable"
            ))),
            ExprKind::Tuple(targets) | ExprKind::List(targets) => {
                let items = value.iterate()?;
                if items.len() != targets.len() {
                    return Err(value_error(format!(
                        "cannot unpack {} values into {} targets",
                        items.len(),
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(env, target, item)?;
                }
                Ok(())
            }
            _ => Err(value_error("invalid assignment target")),
        }
    }
}

#[cfg(test)]
mod tests;
