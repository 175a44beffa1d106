//! Methods of strings, lists and dicts.

use std::sync::Arc;

use crate::errors::{argument_error, key_not_found, value_error, wrong_type, EvalError};
use crate::value::{str_format, Dict, List, MethodFn};
use crate::{ArgValue, Arguments, Thread, Value};

const STRING_METHODS: &[(&str, MethodFn)] = &[
    ("count", str_count),
    ("endswith", str_endswith),
    ("find", str_find),
    ("format", str_format_method),
    ("join", str_join),
    ("lower", str_lower),
    ("lstrip", str_lstrip),
    ("partition", str_partition),
    ("replace", str_replace),
    ("rfind", str_rfind),
    ("rpartition", str_rpartition),
    ("rstrip", str_rstrip),
    ("split", str_split),
    ("startswith", str_startswith),
    ("strip", str_strip),
    ("upper", str_upper),
];

const LIST_METHODS: &[(&str, MethodFn)] = &[
    ("append", list_append),
    ("extend", list_extend),
    ("index", list_index),
    ("insert", list_insert),
    ("pop", list_pop),
    ("remove", list_remove),
];

const DICT_METHODS: &[(&str, MethodFn)] = &[
    ("get", dict_get),
    ("items", dict_items),
    ("keys", dict_keys),
    ("pop", dict_pop),
    ("setdefault", dict_setdefault),
    ("update", dict_update),
    ("values", dict_values),
];

/// The method called `name` on `receiver`'s type.
pub(crate) fn lookup(receiver: &Value, name: &str) -> Option<(&'static str, MethodFn)> {
    let table = match receiver {
        Value::Str(_) => STRING_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => return None,
    };
    table.iter().find(|(n, _)| *n == name).copied()
}

// === Receivers ===

fn recv_str<'a>(receiver: &'a Value, method: &str) -> Result<&'a str, EvalError> {
    receiver
        .as_str()
        .ok_or_else(|| wrong_type(method, "string", receiver.type_name()))
}

fn recv_list<'a>(receiver: &'a Value, method: &str) -> Result<&'a Arc<List>, EvalError> {
    match receiver {
        Value::List(l) => Ok(l),
        other => Err(wrong_type(method, "list", other.type_name())),
    }
}

fn recv_dict<'a>(receiver: &'a Value, method: &str) -> Result<&'a Arc<Dict>, EvalError> {
    match receiver {
        Value::Dict(d) => Ok(d),
        other => Err(wrong_type(method, "dict", other.type_name())),
    }
}

fn no_args(args: Arguments, method: &str) -> Result<(), EvalError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(argument_error(method, "takes no arguments"))
    }
}

fn required(value: Option<Value>) -> Value {
    value.unwrap_or(Value::None)
}

/// Byte offset in `s` to a character index.
fn char_index(s: &str, byte: usize) -> Value {
    Value::Int(i64::try_from(s[..byte].chars().count()).unwrap_or(i64::MAX))
}

// === String methods ===

fn str_count(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "count")?;
    let [sub] = args.bind("count", ["sub"])?;
    let sub = required(sub).into_string("count")?;
    if sub.is_empty() {
        return Err(value_error("count: empty substring"));
    }
    Ok(Value::Int(i64::try_from(s.matches(&*sub).count()).unwrap_or(i64::MAX)))
}

fn affix_matches(
    s: &str,
    affix: Value,
    method: &str,
    test: fn(&str, &str) -> bool,
) -> Result<Value, EvalError> {
    match affix {
        Value::Str(a) => Ok(Value::Bool(test(s, &a))),
        Value::Tuple(items) => {
            for item in items.iter() {
                let a = item.clone().into_string(method)?;
                if test(s, &a) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        other => Err(wrong_type(method, "string or tuple", other.type_name())),
    }
}

fn str_startswith(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "startswith")?;
    let [prefix] = args.bind("startswith", ["prefix"])?;
    affix_matches(s, required(prefix), "startswith", |s, a| s.starts_with(a))
}

fn str_endswith(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "endswith")?;
    let [suffix] = args.bind("endswith", ["suffix"])?;
    affix_matches(s, required(suffix), "endswith", |s, a| s.ends_with(a))
}

fn str_find(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "find")?;
    let [sub] = args.bind("find", ["sub"])?;
    let sub = required(sub).into_string("find")?;
    Ok(s.find(&*sub).map_or(Value::Int(-1), |i| char_index(s, i)))
}

fn str_rfind(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "rfind")?;
    let [sub] = args.bind("rfind", ["sub"])?;
    let sub = required(sub).into_string("rfind")?;
    Ok(s.rfind(&*sub).map_or(Value::Int(-1), |i| char_index(s, i)))
}

fn str_format_method(
    _: &mut Thread,
    receiver: &Value,
    args: Arguments,
) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "format")?;
    str_format(s, &args.positional, &args.named).map(Value::from)
}

fn str_join(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let sep = recv_str(receiver, "join")?;
    let [iterable] = args.bind("join", ["iterable"])?;
    let parts = required(iterable)
        .iterate()?
        .into_iter()
        .map(|v| v.into_string("join"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::from(parts.join(sep)))
}

fn str_lower(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    no_args(args, "lower")?;
    Ok(Value::from(recv_str(receiver, "lower")?.to_lowercase()))
}

fn str_upper(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    no_args(args, "upper")?;
    Ok(Value::from(recv_str(receiver, "upper")?.to_uppercase()))
}

fn strip_chars(args: Arguments, method: &str) -> Result<Option<Vec<char>>, EvalError> {
    let [chars] = args.bind(method, ["chars?"])?;
    match chars {
        None | Some(Value::None) => Ok(None),
        Some(v) => Ok(Some(v.into_string(method)?.chars().collect())),
    }
}

fn str_strip(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "strip")?;
    Ok(Value::from(match strip_chars(args, "strip")? {
        None => s.trim(),
        Some(chars) => s.trim_matches(chars.as_slice()),
    }))
}

fn str_lstrip(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "lstrip")?;
    Ok(Value::from(match strip_chars(args, "lstrip")? {
        None => s.trim_start(),
        Some(chars) => s.trim_start_matches(chars.as_slice()),
    }))
}

fn str_rstrip(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "rstrip")?;
    Ok(Value::from(match strip_chars(args, "rstrip")? {
        None => s.trim_end(),
        Some(chars) => s.trim_end_matches(chars.as_slice()),
    }))
}

fn partition(s: &str, found: Option<usize>, sep: &str, from_right: bool) -> Value {
    let parts = match found {
        Some(i) => [&s[..i], sep, &s[i + sep.len()..]],
        None if from_right => ["", "", s],
        None => [s, "", ""],
    };
    Value::tuple(parts.iter().map(|p| Value::string(p)).collect())
}

fn str_partition(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "partition")?;
    let [sep] = args.bind("partition", ["sep"])?;
    let sep = required(sep).into_string("partition")?;
    if sep.is_empty() {
        return Err(value_error("partition: empty separator"));
    }
    Ok(partition(s, s.find(&*sep), &sep, false))
}

fn str_rpartition(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "rpartition")?;
    let [sep] = args.bind("rpartition", ["sep"])?;
    let sep = required(sep).into_string("rpartition")?;
    if sep.is_empty() {
        return Err(value_error("rpartition: empty separator"));
    }
    Ok(partition(s, s.rfind(&*sep), &sep, true))
}

fn str_replace(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "replace")?;
    let [old, new, count] = args.bind("replace", ["old", "new", "count?"])?;
    let old = required(old).into_string("replace")?;
    let new = required(new).into_string("replace")?;
    let count = count.map_or(Ok(-1), |c| c.into_int("replace"))?;
    Ok(Value::from(match usize::try_from(count) {
        Ok(n) => s.replacen(&*old, &new, n),
        Err(_) => s.replace(&*old, &new),
    }))
}

fn str_split(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let s = recv_str(receiver, "split")?;
    let [sep, maxsplit] = args.bind("split", ["sep?", "maxsplit?"])?;
    let max = maxsplit
        .map_or(Ok(-1), |m| m.into_int("split"))
        .map(|m| usize::try_from(m).ok())?;
    let parts: Vec<String> = match sep {
        None | Some(Value::None) => split_whitespace(s, max),
        Some(sep) => {
            let sep = sep.into_string("split")?;
            if sep.is_empty() {
                return Err(value_error("split: empty separator"));
            }
            match max {
                Some(m) => s.splitn(m + 1, &*sep).map(str::to_string).collect(),
                None => s.split(&*sep).map(str::to_string).collect(),
            }
        }
    };
    Ok(Value::list(parts.into_iter().map(Value::from).collect()))
}

/// Split on runs of whitespace, at most `max` times.
fn split_whitespace(s: &str, max: Option<usize>) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if max.is_some_and(|m| out.len() == m) {
            out.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(i) => {
                out.push(rest[..i].to_string());
                rest = rest[i..].trim_start();
            }
            None => {
                out.push(rest.to_string());
                break;
            }
        }
    }
    out
}

// === List methods ===

fn list_append(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "append")?;
    let [x] = args.bind("append", ["x"])?;
    list.mutate(|items| items.push(required(x)))?;
    Ok(Value::None)
}

fn list_extend(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "extend")?;
    let [x] = args.bind("extend", ["x"])?;
    let extra = required(x).iterate()?;
    list.mutate(|items| items.extend(extra))?;
    Ok(Value::None)
}

fn list_index(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "index")?;
    let [x] = args.bind("index", ["x"])?;
    let x = required(x);
    let position = list.read().iter().position(|item| *item == x);
    match position {
        Some(i) => Ok(Value::Int(i64::try_from(i).unwrap_or(i64::MAX))),
        None => Err(value_error(format!("index: {} not in list", x.repr()))),
    }
}

fn list_insert(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "insert")?;
    let [index, x] = args.bind("insert", ["index", "x"])?;
    let index = required(index).into_int("insert")?;
    let x = required(x);
    list.mutate(|items| {
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let at = if index < 0 { index + len } else { index }.clamp(0, len);
        items.insert(usize::try_from(at).unwrap_or(0), x);
    })?;
    Ok(Value::None)
}

fn list_pop(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "pop")?;
    let [index] = args.bind("pop", ["index?"])?;
    let index = index.map_or(Ok(-1), |i| i.into_int("pop"))?;
    list.mutate(|items| {
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let at = if index < 0 { index + len } else { index };
        match usize::try_from(at) {
            Ok(i) if i < items.len() => Ok(items.remove(i)),
            _ => Err(crate::errors::index_out_of_range("list", index, items.len())),
        }
    })?
}

fn list_remove(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let list = recv_list(receiver, "remove")?;
    let [x] = args.bind("remove", ["x"])?;
    let x = required(x);
    list.mutate(|items| match items.iter().position(|item| *item == x) {
        Some(i) => {
            items.remove(i);
            Ok(Value::None)
        }
        None => Err(value_error(format!("remove: {} not in list", x.repr()))),
    })?
}

// === Dict methods ===

fn dict_get(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let dict = recv_dict(receiver, "get")?;
    let [key, default] = args.bind("get", ["key", "default?"])?;
    Ok(dict
        .get(&required(key))?
        .unwrap_or_else(|| default.unwrap_or(Value::None)))
}

fn dict_items(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    no_args(args, "items")?;
    let dict = recv_dict(receiver, "items")?;
    Ok(Value::list(
        dict.items()
            .into_iter()
            .map(|(k, v)| Value::tuple(vec![k, v]))
            .collect(),
    ))
}

fn dict_keys(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    no_args(args, "keys")?;
    Ok(Value::list(recv_dict(receiver, "keys")?.keys()))
}

fn dict_values(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    no_args(args, "values")?;
    Ok(Value::list(recv_dict(receiver, "values")?.values()))
}

fn dict_pop(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let dict = recv_dict(receiver, "pop")?;
    let [key, default] = args.bind("pop", ["key", "default?"])?;
    let key = required(key);
    match dict.remove(&key)? {
        Some(value) => Ok(value),
        None => default.ok_or_else(|| key_not_found(key.repr())),
    }
}

fn dict_setdefault(
    _: &mut Thread,
    receiver: &Value,
    args: Arguments,
) -> Result<Value, EvalError> {
    let dict = recv_dict(receiver, "setdefault")?;
    let [key, default] = args.bind("setdefault", ["key", "default?"])?;
    let key = required(key);
    if let Some(existing) = dict.get(&key)? {
        return Ok(existing);
    }
    let value = default.unwrap_or(Value::None);
    dict.insert(key, value.clone())?;
    Ok(value)
}

fn dict_update(_: &mut Thread, receiver: &Value, args: Arguments) -> Result<Value, EvalError> {
    let dict = recv_dict(receiver, "update")?;
    let Arguments { positional, named } = args;
    if positional.len() > 1 {
        return Err(argument_error("update", "accepts at most one positional argument"));
    }
    if let Some(source) = positional.into_iter().next() {
        match source {
            Value::Dict(other) => {
                for (k, v) in other.items() {
                    dict.insert(k, v)?;
                }
            }
            other => {
                for pair in other.iterate()? {
                    match pair.as_sequence().as_deref() {
                        Some([k, v]) => dict.insert(k.clone(), v.clone())?,
                        _ => return Err(value_error("update: elements must be pairs")),
                    }
                }
            }
        }
    }
    for (name, value) in named {
        dict.insert(Value::string(name.as_str()), value)?;
    }
    Ok(Value::None)
}

#[cfg(test)]
mod tests;
