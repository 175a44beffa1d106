//! Calling builtins, methods and language functions.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sky_ir::ast::ParamKind;
use sky_ir::Name;

use super::{Env, Eval, Flow};
use crate::errors::{argument_error, not_callable, value_error, EvalError};
use crate::value::{Dict, Function};
use crate::{Arguments, Thread, Value};

/// Call any callable value.
pub fn call(thread: &mut Thread, callee: &Value, args: Arguments) -> Result<Value, EvalError> {
    match callee {
        Value::Builtin(builtin) => builtin.invoke(thread, args),
        Value::BoundMethod(method) => (method.func)(thread, &method.receiver, args),
        Value::Function(function) => call_function(thread, function, args),
        other => Err(not_callable(other.type_name())),
    }
}

fn call_function(
    thread: &mut Thread,
    function: &Arc<Function>,
    args: Arguments,
) -> Result<Value, EvalError> {
    let name = function.name();
    let locals = bind_params(function, args)?;

    let mut env = Env::function(function, locals)?;
    thread.enter_call(&function.def)?;
    let result = Eval::new(thread).exec_block(&mut env, &function.def.body);
    thread.exit_call();

    match result {
        Ok(Flow::Return(value)) => Ok(value),
        Ok(Flow::Normal) => Ok(Value::None),
        Ok(Flow::Break | Flow::Continue) => Err(value_error("break or continue outside loop")),
        Err(mut err) => {
            err.push_frame(name);
            Err(err)
        }
    }
}

/// Match arguments to parameters, Python-style.
///
/// Positional arguments fill the parameters before `*args`; the rest go to
/// `*args`. Named arguments fill any named parameter; unknown names go to
/// `**kwargs`. Unfilled optional parameters take their default.
fn bind_params(
    function: &Function,
    args: Arguments,
) -> Result<FxHashMap<Name, Value>, EvalError> {
    let def = &function.def;
    let fname = def.name.as_str();
    let mut locals = FxHashMap::default();

    let star = def
        .params
        .iter()
        .position(|p| matches!(p.kind, ParamKind::Args));
    let positional_slots = star.unwrap_or_else(|| {
        def.params
            .iter()
            .take_while(|p| !matches!(p.kind, ParamKind::Kwargs))
            .count()
    });

    let mut positional = args.positional.into_iter();
    for param in def.params.iter().take(positional_slots) {
        match positional.next() {
            Some(value) => {
                locals.insert(param.name, value);
            }
            None => break,
        }
    }
    let extra: Vec<Value> = positional.collect();
    match def.params.iter().find(|p| matches!(p.kind, ParamKind::Args)) {
        Some(param) => {
            locals.insert(param.name, Value::tuple(extra));
        }
        None if !extra.is_empty() => {
            return Err(argument_error(
                fname,
                format!(
                    "accepts at most {positional_slots} positional arguments, got {}",
                    positional_slots + extra.len()
                ),
            ));
        }
        None => {}
    }

    let kwargs_param = def
        .params
        .iter()
        .find(|p| matches!(p.kind, ParamKind::Kwargs));
    let kwargs = Dict::new();
    for (name, value) in args.named {
        let is_param = def.params.iter().any(|p| {
            p.name == name && matches!(p.kind, ParamKind::Required | ParamKind::Optional(_))
        });
        if is_param {
            if locals.contains_key(&name) {
                return Err(argument_error(
                    fname,
                    format!("got multiple values for parameter '{name}'"),
                ));
            }
            locals.insert(name, value);
        } else if kwargs_param.is_some() {
            kwargs.insert(Value::string(name.as_str()), value)?;
        } else {
            return Err(argument_error(
                fname,
                format!("unexpected keyword argument '{name}'"),
            ));
        }
    }
    if let Some(param) = kwargs_param {
        locals.insert(param.name, Value::Dict(Arc::new(kwargs)));
    }

    for (param, default) in def.params.iter().zip(&function.defaults) {
        if locals.contains_key(&param.name) {
            continue;
        }
        match (&param.kind, default) {
            (ParamKind::Optional(_), Some(default)) => {
                locals.insert(param.name, default.clone());
            }
            (ParamKind::Required, _) => {
                return Err(argument_error(
                    fname,
                    format!("missing required argument '{}'", param.name),
                ));
            }
            _ => {}
        }
    }
    Ok(locals)
}
