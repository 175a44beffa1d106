//! `%` interpolation and `str.format`.

use sky_ir::Name;

use super::Value;
use crate::errors::{value_error, wrong_type, EvalError};

/// `template % args`. A tuple supplies one value per directive; anything
/// else is a single value. Supports `%s`, `%r`, `%d` and `%%`.
pub fn percent_format(template: &str, args: &Value) -> Result<String, EvalError> {
    let values: Vec<Value> = match args {
        Value::Tuple(items) => items.to_vec(),
        other => vec![other.clone()],
    };
    let mut next = values.into_iter();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let directive = chars
            .next()
            .ok_or_else(|| value_error("incomplete format directive"))?;
        if directive == '%' {
            out.push('%');
            continue;
        }
        let value = next
            .next()
            .ok_or_else(|| value_error("not enough arguments for format string"))?;
        match directive {
            's' => out.push_str(&value.to_str()),
            'r' => out.push_str(&value.repr()),
            'd' => match value {
                Value::Int(n) => out.push_str(&n.to_string()),
                Value::Bool(b) => out.push_str(if b { "1" } else { "0" }),
                other => return Err(wrong_type("%d format", "int", other.type_name())),
            },
            other => {
                return Err(value_error(format!(
                    "unsupported format character '{other}'"
                )))
            }
        }
    }

    if next.next().is_some() {
        return Err(value_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}

/// `template.format(*positional, **named)`: `{}`, `{0}`, `{name}`, `{{`, `}}`.
pub(crate) fn str_format(
    template: &str,
    positional: &[Value],
    named: &[(Name, Value)],
) -> Result<String, EvalError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(value_error("single '}' in format string")),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => return Err(value_error("unmatched '{' in format string")),
                    }
                }
                let value = if field.is_empty() {
                    let value = positional.get(auto_index);
                    auto_index += 1;
                    value.ok_or_else(|| value_error("not enough arguments for format string"))?
                } else if let Ok(index) = field.parse::<usize>() {
                    positional.get(index).ok_or_else(|| {
                        value_error(format!("format index {index} out of range"))
                    })?
                } else {
                    let key = Name::intern(&field);
                    named
                        .iter()
                        .find(|(k, _)| *k == key)
                        .map(|(_, v)| v)
                        .ok_or_else(|| value_error(format!("missing format key '{field}'")))?
                };
                out.push_str(&value.to_str());
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
