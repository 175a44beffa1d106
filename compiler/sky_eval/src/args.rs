//! Call arguments and binding them to named parameters.

use sky_ir::Name;

use crate::errors::{argument_error, wrong_type, EvalError};
use crate::Value;

/// Arguments of one call, as written at the call site after `*`/`**`
/// expansion.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub named: Vec<(Name, Value)>,
}

impl Arguments {
    pub fn positional(values: Vec<Value>) -> Self {
        Arguments {
            positional: values,
            named: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Bind to a fixed parameter list. Parameters ending in `?` are optional.
    ///
    /// Positional arguments fill parameters in order; named arguments fill by
    /// name. Too many positional arguments, unknown or repeated names and
    /// missing required parameters are errors that name `function`.
    pub fn bind<const N: usize>(
        self,
        function: &str,
        params: [&str; N],
    ) -> Result<[Option<Value>; N], EvalError> {
        let mut slots: [Option<Value>; N] = std::array::from_fn(|_| None);
        let names: [&str; N] = params.map(|p| p.strip_suffix('?').unwrap_or(p));

        if self.positional.len() > N {
            return Err(argument_error(
                function,
                format!(
                    "accepts at most {N} positional arguments, got {}",
                    self.positional.len()
                ),
            ));
        }
        for (slot, value) in slots.iter_mut().zip(self.positional) {
            *slot = Some(value);
        }
        for (name, value) in self.named {
            let Some(i) = names.iter().position(|n| *n == name.as_str()) else {
                return Err(argument_error(
                    function,
                    format!("unexpected keyword argument '{name}'"),
                ));
            };
            if slots[i].is_some() {
                return Err(argument_error(
                    function,
                    format!("got multiple values for argument '{name}'"),
                ));
            }
            slots[i] = Some(value);
        }
        for (i, param) in params.iter().enumerate() {
            if slots[i].is_none() && !param.ends_with('?') {
                return Err(argument_error(
                    function,
                    format!("missing required argument '{}'", names[i]),
                ));
            }
        }
        Ok(slots)
    }

    /// Reject named arguments; return the positional ones.
    pub fn positional_only(self, function: &str) -> Result<Vec<Value>, EvalError> {
        if let Some((name, _)) = self.named.first() {
            return Err(argument_error(
                function,
                format!("unexpected keyword argument '{name}'"),
            ));
        }
        Ok(self.positional)
    }
}

/// Helpers for unpacking bound arguments with type checks.
pub trait ArgValue {
    fn into_string(self, context: &str) -> Result<String, EvalError>;
    fn into_bool(self, context: &str) -> Result<bool, EvalError>;
    fn into_int(self, context: &str) -> Result<i64, EvalError>;
    /// A list or tuple of strings.
    fn into_string_list(self, context: &str) -> Result<Vec<String>, EvalError>;
}

impl ArgValue for Value {
    fn into_string(self, context: &str) -> Result<String, EvalError> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(wrong_type(context, "string", other.type_name())),
        }
    }

    fn into_bool(self, context: &str) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(b),
            other => Err(wrong_type(context, "bool", other.type_name())),
        }
    }

    fn into_int(self, context: &str) -> Result<i64, EvalError> {
        match self {
            Value::Int(n) => Ok(n),
            other => Err(wrong_type(context, "int", other.type_name())),
        }
    }

    fn into_string_list(self, context: &str) -> Result<Vec<String>, EvalError> {
        let Some(items) = self.as_sequence() else {
            return Err(wrong_type(context, "list of strings", self.type_name()));
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Str(s) => Ok(s.to_string()),
                other => Err(wrong_type(context, "list of strings", other.type_name())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
