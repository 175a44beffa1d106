//! Builtins that reach the filesystem: `subinclude` and `glob`.

use sky_eval::errors::{argument_error, host_error, invariant};
use sky_eval::{ArgValue, Arguments, Builtin, EvalError, Thread, Value};

use super::{bool_arg, strings_arg};
use crate::context::{build_state, current_package};

/// `subinclude(path, ...)`: load each file and copy its public top-level
/// names into the calling module, so later statements can use them.
pub(super) fn subinclude(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let paths = args.positional_only(builtin.name())?;
    if paths.is_empty() {
        return Err(argument_error(builtin.name(), "at least one path is required"));
    }
    for path in paths {
        let path = path.into_string("subinclude: path")?;
        let bindings = thread.load(&path)?;
        let Some(module) = thread.current_module().cloned() else {
            return Err(invariant("subinclude called outside of a module"));
        };
        module.retain(&bindings);
        for (name, value) in bindings.iter() {
            if !name.as_str().starts_with('_') {
                module.define(name, value.clone())?;
            }
        }
    }
    Ok(Value::None)
}

/// `glob(includes, exclude=[], excludes=[], hidden=False)`
pub(super) fn glob(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let package = current_package(thread)?;
    let state = build_state(thread)?;
    let [includes, exclude, excludes, hidden] =
        args.bind(builtin.name(), ["includes", "exclude?", "excludes?", "hidden?"])?;

    let includes = strings_arg(includes, "glob: includes")?;
    let mut excluded = strings_arg(exclude, "glob: exclude")?;
    excluded.extend(strings_arg(excludes, "glob: excludes")?);
    let hidden = bool_arg(hidden, "glob: hidden")?;

    let files = state
        .globber
        .glob(package.dir(), &includes, &excluded, &excluded, hidden)
        .map_err(|e| host_error(e.to_string()))?;
    Ok(Value::string_list(&files))
}
