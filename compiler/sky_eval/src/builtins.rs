//! Universe builtins: the functions every file can call without loading.

pub(crate) mod methods;

use std::cmp::Ordering;
use std::sync::Arc;

use sky_ir::Name;

use crate::errors::{argument_error, value_error, wrong_type, EvalError};
use crate::eval::{call, has_attr};
use crate::log_sink::Severity;
use crate::value::{Builtin, Dict, Struct};
use crate::{ArgValue, Arguments, GlobalsBuilder, Thread, Value};

pub(crate) fn register_universe(globals: &mut GlobalsBuilder) {
    globals.set_builtin("len", len);
    globals.set_builtin("str", str_);
    globals.set_builtin("repr", repr);
    globals.set_builtin("int", int);
    globals.set_builtin("bool", bool_);
    globals.set_builtin("list", list);
    globals.set_builtin("tuple", tuple);
    globals.set_builtin("dict", dict);
    globals.set_builtin("range", range);
    globals.set_builtin("sorted", sorted);
    globals.set_builtin("reversed", reversed);
    globals.set_builtin("enumerate", enumerate);
    globals.set_builtin("zip", zip);
    globals.set_builtin("any", any);
    globals.set_builtin("all", all);
    globals.set_builtin("min", min);
    globals.set_builtin("max", max);
    globals.set_builtin("type", type_);
    globals.set_builtin("hasattr", hasattr);
    globals.set_builtin("getattr", getattr);
    globals.set_builtin("struct", struct_);
    globals.set_builtin("print", print);
}

fn one_arg(builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x] = args.bind(builtin.name(), ["x"])?;
    Ok(x.unwrap_or(Value::None))
}

fn len(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let n = match one_arg(builtin, args)? {
        Value::Str(s) => s.chars().count(),
        Value::List(l) => l.read().len(),
        Value::Tuple(t) => t.len(),
        Value::Dict(d) => d.len(),
        other => return Err(wrong_type("len", "sequence", other.type_name())),
    };
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| value_error("len: length overflows int"))
}

fn str_(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    Ok(Value::from(one_arg(builtin, args)?.to_str()))
}

fn repr(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    Ok(Value::from(one_arg(builtin, args)?.repr()))
}

fn int(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x, base] = args.bind(builtin.name(), ["x", "base?"])?;
    match (x.unwrap_or(Value::None), base) {
        (Value::Int(n), None) => Ok(Value::Int(n)),
        (Value::Bool(b), None) => Ok(Value::Int(i64::from(b))),
        (Value::Str(s), base) => {
            let base = match base {
                Some(b) => u32::try_from(b.into_int("int: base")?)
                    .map_err(|_| value_error("int: invalid base"))?,
                None => 10,
            };
            parse_int(&s, base)
        }
        (other, _) => Err(wrong_type("int", "int, bool or string", other.type_name())),
    }
}

fn parse_int(text: &str, base: u32) -> Result<Value, EvalError> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = if base == 16 {
        digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits)
    } else {
        digits
    };
    if !(2..=36).contains(&base) {
        return Err(value_error(format!("int: invalid base {base}")));
    }
    let magnitude = i64::from_str_radix(digits, base)
        .map_err(|_| value_error(format!("int: invalid literal {text:?}")))?;
    Ok(Value::Int(if negative { -magnitude } else { magnitude }))
}

fn bool_(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x] = args.bind(builtin.name(), ["x?"])?;
    Ok(Value::Bool(x.is_some_and(|v| v.truth())))
}

fn list(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x] = args.bind(builtin.name(), ["x?"])?;
    match x {
        Some(x) => Ok(Value::list(x.iterate()?)),
        None => Ok(Value::list(Vec::new())),
    }
}

fn tuple(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x] = args.bind(builtin.name(), ["x?"])?;
    match x {
        Some(x) => Ok(Value::tuple(x.iterate()?)),
        None => Ok(Value::tuple(Vec::new())),
    }
}

fn dict(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let Arguments { positional, named } = args;
    if positional.len() > 1 {
        return Err(argument_error(builtin.name(), "accepts at most one positional argument"));
    }
    let dict = Dict::new();
    if let Some(source) = positional.into_iter().next() {
        match source {
            Value::Dict(d) => {
                for (k, v) in d.items() {
                    dict.insert(k, v)?;
                }
            }
            other => {
                for pair in other.iterate()? {
                    let items = pair
                        .as_sequence()
                        .filter(|items| items.len() == 2)
                        .ok_or_else(|| value_error("dict: elements must be pairs"))?;
                    let mut items = items.into_iter();
                    if let (Some(k), Some(v)) = (items.next(), items.next()) {
                        dict.insert(k, v)?;
                    }
                }
            }
        }
    }
    for (name, value) in named {
        dict.insert(Value::string(name.as_str()), value)?;
    }
    Ok(Value::Dict(Arc::new(dict)))
}

fn range(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [a, b, step] = args.bind(builtin.name(), ["start_or_stop", "stop?", "step?"])?;
    let a = a.map_or(Ok(0), |v| v.into_int("range"))?;
    let (start, stop) = match b {
        Some(b) => (a, b.into_int("range")?),
        None => (0, a),
    };
    let step = step.map_or(Ok(1), |v| v.into_int("range"))?;
    if step == 0 {
        return Err(value_error("range: step must not be zero"));
    }
    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::list(out))
}

fn sorted(thread: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [iterable, key, reverse] = args.bind(builtin.name(), ["iterable", "key?", "reverse?"])?;
    let items = iterable.unwrap_or(Value::None).iterate()?;
    let reverse = reverse.map_or(Ok(false), |v| v.into_bool("sorted: reverse"))?;

    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let k = match &key {
            Some(f) if !f.is_none() => call(thread, f, Arguments::positional(vec![item.clone()]))?,
            _ => item.clone(),
        };
        keyed.push((k, item));
    }

    let mut error = None;
    keyed.sort_by(|(a, _), (b, _)| {
        a.compare(b).unwrap_or_else(|e| {
            error.get_or_insert(e);
            Ordering::Equal
        })
    });
    if let Some(e) = error {
        return Err(e);
    }
    let mut out: Vec<Value> = keyed.into_iter().map(|(_, v)| v).collect();
    if reverse {
        out.reverse();
    }
    Ok(Value::list(out))
}

fn reversed(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let mut items = one_arg(builtin, args)?.iterate()?;
    items.reverse();
    Ok(Value::list(items))
}

fn enumerate(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [iterable, start] = args.bind(builtin.name(), ["iterable", "start?"])?;
    let start = start.map_or(Ok(0), |v| v.into_int("enumerate: start"))?;
    let items = iterable.unwrap_or(Value::None).iterate()?;
    let mut out = Vec::with_capacity(items.len());
    let mut i = start;
    for item in items {
        out.push(Value::tuple(vec![Value::Int(i), item]));
        i = i.saturating_add(1);
    }
    Ok(Value::list(out))
}

fn zip(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let sequences = args
        .positional_only(builtin.name())?
        .iter()
        .map(Value::iterate)
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = sequences.iter().map(Vec::len).min().unwrap_or(0);
    let out = (0..shortest)
        .map(|i| Value::tuple(sequences.iter().map(|s| s[i].clone()).collect()))
        .collect();
    Ok(Value::list(out))
}

fn any(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    Ok(Value::Bool(one_arg(builtin, args)?.iterate()?.iter().any(Value::truth)))
}

fn all(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    Ok(Value::Bool(one_arg(builtin, args)?.iterate()?.iter().all(Value::truth)))
}

fn extreme(builtin: &Builtin, args: Arguments, want: Ordering) -> Result<Value, EvalError> {
    let mut positional = args.positional_only(builtin.name())?;
    let items = if positional.len() == 1 {
        positional.remove(0).iterate()?
    } else {
        positional
    };
    let mut items = items.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| value_error(format!("{}: empty sequence", builtin.name())))?;
    for item in items {
        if item.compare(&best)? == want {
            best = item;
        }
    }
    Ok(best)
}

fn min(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    extreme(builtin, args, Ordering::Less)
}

fn max(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    extreme(builtin, args, Ordering::Greater)
}

fn type_(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    Ok(Value::string(one_arg(builtin, args)?.type_name()))
}

fn hasattr(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x, name] = args.bind(builtin.name(), ["x", "name"])?;
    let name = name.unwrap_or(Value::None).into_string("hasattr: name")?;
    Ok(Value::Bool(has_attr(&x.unwrap_or(Value::None), &name)))
}

fn getattr(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let [x, name, default] = args.bind(builtin.name(), ["x", "name", "default?"])?;
    let x = x.unwrap_or(Value::None);
    let name = name.unwrap_or(Value::None).into_string("getattr: name")?;
    match crate::eval::get_attr(&x, Name::intern(&name)) {
        Ok(value) => Ok(value),
        Err(err) => default.ok_or(err),
    }
}

fn struct_(_: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    if !args.positional.is_empty() {
        return Err(argument_error(builtin.name(), "accepts keyword arguments only"));
    }
    Ok(Value::Struct(Arc::new(Struct::new("struct", args.named))))
}

/// `print(*args, sep=" ")` writes one info line to the log sink.
fn print(thread: &mut Thread, builtin: &Builtin, args: Arguments) -> Result<Value, EvalError> {
    let mut sep = " ".to_string();
    for (name, value) in &args.named {
        if name.as_str() == "sep" {
            sep = value.clone().into_string("print: sep")?;
        } else {
            return Err(argument_error(
                builtin.name(),
                format!("unexpected keyword argument '{name}'"),
            ));
        }
    }
    let line = args
        .positional
        .iter()
        .map(Value::to_str)
        .collect::<Vec<_>>()
        .join(&sep);
    thread.log_sink().log(Severity::Info, &line);
    Ok(Value::None)
}

#[cfg(test)]
mod tests;
