//! Operators, indexing and attribute access.

use std::cmp::Ordering;
use std::sync::Arc;

use sky_ir::ast::{BinaryOp, UnaryOp};
use sky_ir::Name;

use crate::builtins::methods;
use crate::errors::{
    division_by_zero, index_out_of_range, key_not_found, no_attribute, overflow,
    unsupported_operands, unsupported_unary, value_error, wrong_type, EvalError,
};
use crate::value::{percent_format, BoundMethod, Dict};
use crate::Value;

pub(crate) fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
        (UnaryOp::Plus, Value::Int(n)) => Ok(Value::Int(*n)),
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.truth())),
        (op, v) => Err(unsupported_unary(op.as_symbol(), v.type_name())),
    }
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let mismatch = || unsupported_operands(op.as_symbol(), left.type_name(), right.type_name());
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => Ok(Value::Bool(left.compare(right)? == Ordering::Less)),
        BinaryOp::LtEq => Ok(Value::Bool(left.compare(right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(left.compare(right)? == Ordering::Greater)),
        BinaryOp::GtEq => Ok(Value::Bool(left.compare(right)? != Ordering::Less)),
        BinaryOp::In => contains(right, left).map(Value::Bool),
        BinaryOp::NotIn => contains(right, left).map(|found| Value::Bool(!found)),
        BinaryOp::And | BinaryOp::Or => Err(value_error("short-circuit operator reached binary()")),
        BinaryOp::Add => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(*b).map(Value::Int).ok_or_else(|| overflow("+"))
            }
            (Value::Str(a), Value::Str(b)) => Ok(Value::from(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut items = a.read().clone();
                items.extend(b.read().iter().cloned());
                Ok(Value::list(items))
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => Err(mismatch()),
        },
        BinaryOp::Sub => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Int).ok_or_else(|| overflow("-"))
            }
            _ => Err(mismatch()),
        },
        BinaryOp::Mul => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(*b).map(Value::Int).ok_or_else(|| overflow("*"))
            }
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::from(s.repeat(repeat_count(s.len(), *n)?)))
            }
            (Value::List(l), Value::Int(n)) | (Value::Int(n), Value::List(l)) => {
                Ok(Value::list(repeat_items(&l.read(), *n)?))
            }
            (Value::Tuple(t), Value::Int(n)) | (Value::Int(n), Value::Tuple(t)) => {
                Ok(Value::tuple(repeat_items(t, *n)?))
            }
            _ => Err(mismatch()),
        },
        BinaryOp::FloorDiv => match (left, right) {
            (Value::Int(a), Value::Int(b)) => floor_div(*a, *b).map(Value::Int),
            _ => Err(mismatch()),
        },
        BinaryOp::Mod => match (left, right) {
            (Value::Int(a), Value::Int(b)) => floor_mod(*a, *b).map(Value::Int),
            (Value::Str(template), args) => percent_format(template, args).map(Value::from),
            _ => Err(mismatch()),
        },
        BinaryOp::BitOr => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
            (Value::Dict(a), Value::Dict(b)) => {
                let merged = Dict::from_pairs(a.items())?;
                for (k, v) in b.items() {
                    merged.insert(k, v)?;
                }
                Ok(Value::Dict(Arc::new(merged)))
            }
            _ => Err(mismatch()),
        },
    }
}

/// Largest string (in bytes) or sequence (in items) a repetition may build.
const MAX_REPEAT_LEN: usize = 1 << 30;

/// Number of copies of a `len`-long operand; negative counts give none.
fn repeat_count(len: usize, n: i64) -> Result<usize, EvalError> {
    if len == 0 {
        return Ok(0);
    }
    let count = usize::try_from(n.max(0)).map_err(|_| overflow("*"))?;
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(count),
        _ => Err(overflow("*")),
    }
}

fn repeat_items(items: &[Value], n: i64) -> Result<Vec<Value>, EvalError> {
    let count = repeat_count(items.len(), n)?;
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    Ok(out)
}

/// Quotient rounded toward negative infinity.
fn floor_div(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(division_by_zero());
    }
    let q = a.checked_div(b).ok_or_else(|| overflow("//"))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(division_by_zero());
    }
    let r = a.checked_rem(b).ok_or_else(|| overflow("%"))?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// `needle in haystack`.
pub(crate) fn contains(haystack: &Value, needle: &Value) -> Result<bool, EvalError> {
    match haystack {
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(&**sub)),
            other => Err(wrong_type("'in <string>'", "string", other.type_name())),
        },
        Value::List(l) => Ok(l.read().contains(needle)),
        Value::Tuple(t) => Ok(t.contains(needle)),
        Value::Dict(d) => d.contains(needle),
        other => Err(unsupported_operands("in", needle.type_name(), other.type_name())),
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(type_name: &'static str, index: i64, len: usize) -> Result<usize, EvalError> {
    let len_i = i64::try_from(len).map_err(|_| overflow("index"))?;
    let resolved = if index < 0 { index + len_i } else { index };
    if (0..len_i).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| overflow("index"))
    } else {
        Err(index_out_of_range(type_name, index, len))
    }
}

pub(crate) fn index(receiver: &Value, index: &Value) -> Result<Value, EvalError> {
    match (receiver, index) {
        (Value::List(l), Value::Int(i)) => {
            let items = l.read();
            let i = normalize_index("list", *i, items.len())?;
            Ok(items[i].clone())
        }
        (Value::Tuple(t), Value::Int(i)) => {
            let i = normalize_index("tuple", *i, t.len())?;
            Ok(t[i].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index("string", *i, chars.len())?;
            Ok(Value::from(chars[i].to_string()))
        }
        (Value::Dict(d), key) => d.get(key)?.ok_or_else(|| key_not_found(key.repr())),
        (Value::List(_) | Value::Tuple(_) | Value::Str(_), other) => {
            Err(wrong_type("index", "int", other.type_name()))
        }
        (other, _) => Err(value_error(format!(
            "'{}' value is not subscriptable",
            other.type_name()
        ))),
    }
}

pub(crate) fn set_index(receiver: &Value, index: Value, value: Value) -> Result<(), EvalError> {
    match (receiver, index) {
        (Value::List(l), Value::Int(i)) => {
            let len = l.read().len();
            let i = normalize_index("list", i, len)?;
            l.mutate(|items| items[i] = value)
        }
        (Value::Dict(d), key) => d.insert(key, value),
        (Value::List(_), other) => Err(wrong_type("index", "int", other.type_name())),
        (other, _) => Err(value_error(format!(
            "'{}' value does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Clamp slice bounds the way Python does.
fn slice_range(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64| -> usize {
        let resolved = if bound < 0 { bound + len_i } else { bound };
        usize::try_from(resolved.clamp(0, len_i)).unwrap_or(0)
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);
    (start, end.max(start))
}

pub(crate) fn slice(
    receiver: &Value,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Value, EvalError> {
    match receiver {
        Value::List(l) => {
            let items = l.read();
            let (a, b) = slice_range(items.len(), start, end);
            Ok(Value::list(items[a..b].to_vec()))
        }
        Value::Tuple(t) => {
            let (a, b) = slice_range(t.len(), start, end);
            Ok(Value::tuple(t[a..b].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (a, b) = slice_range(chars.len(), start, end);
            Ok(Value::from(chars[a..b].iter().collect::<String>()))
        }
        other => Err(value_error(format!(
            "'{}' value is not sliceable",
            other.type_name()
        ))),
    }
}

pub(crate) fn get_attr(receiver: &Value, attr: Name) -> Result<Value, EvalError> {
    if let Value::Struct(s) = receiver {
        return s
            .get(attr)
            .cloned()
            .ok_or_else(|| no_attribute(&s.name, attr.as_str()));
    }
    match methods::lookup(receiver, attr.as_str()) {
        Some((name, func)) => Ok(Value::BoundMethod(Arc::new(BoundMethod {
            receiver: receiver.clone(),
            name,
            func,
        }))),
        None => Err(no_attribute(receiver.type_name(), attr.as_str())),
    }
}

/// Whether `attr` would resolve on `receiver`.
pub(crate) fn has_attr(receiver: &Value, attr: &str) -> bool {
    match receiver {
        Value::Struct(s) => s.get(Name::intern(attr)).is_some(),
        other => methods::lookup(other, attr).is_some(),
    }
}
