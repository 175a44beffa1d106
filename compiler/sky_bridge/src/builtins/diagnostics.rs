//! `fail` and the `log` namespace.

use sky_eval::errors::{argument_error, fail as fail_error, fatal, invariant};
use sky_eval::{percent_format, Arguments, Builtin, EvalError, Severity, Thread, Value};

/// `fail(msg, ...)`: abort the current file with the arguments joined by
/// spaces.
pub(super) fn fail(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let parts = args.positional_only(builtin.name())?;
    if parts.is_empty() {
        return Err(argument_error(builtin.name(), "message is required"));
    }
    let message = parts.iter().map(Value::to_str).collect::<Vec<_>>().join(" ");
    Err(fail_error(message))
}

/// `log.<severity>(msg, *args)`: `msg % args` to the log sink.
///
/// `log.fatal` also aborts the whole parse.
pub(super) fn log(thread: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let member = builtin.name().strip_prefix("log.").unwrap_or(builtin.name());
    let Some(severity) = Severity::from_name(member) else {
        return Err(invariant(format!("no log severity named '{member}'")));
    };
    let mut values = args.positional_only(builtin.name())?.into_iter();
    let Some(first) = values.next() else {
        return Err(argument_error(builtin.name(), "message is required"));
    };
    let rest: Vec<Value> = values.collect();
    let message = if rest.is_empty() {
        first.to_str()
    } else {
        percent_format(&first.to_str(), &Value::tuple(rest))?
    };

    thread.log_sink().log(severity, &message);
    if severity == Severity::Fatal {
        return Err(fatal(message));
    }
    Ok(Value::None)
}
