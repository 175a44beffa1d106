//! Runtime values.
//!
//! Values are cheap to clone: every heap variant is behind an `Arc`, so a
//! value can be stored in the shared globals and read by every worker.
//! Lists and dicts are the only mutable values. Both carry a frozen flag
//! that is set once the module defining them finishes loading; mutation
//! after that is a runtime error.

mod dict;
mod format;

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;
use sky_ir::ast::FunctionDef;
use sky_ir::Name;

use crate::errors::{frozen, unhashable, unsupported_operands, EvalError};
use crate::module::ModuleScope;
use crate::{Arguments, Thread};

pub use dict::Dict;
pub use format::percent_format;
pub(crate) use format::str_format;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    List(Arc<List>),
    Tuple(Arc<[Value]>),
    Dict(Arc<Dict>),
    Function(Arc<Function>),
    Builtin(Arc<Builtin>),
    BoundMethod(Arc<BoundMethod>),
    Struct(Arc<Struct>),
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(List::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Arc::from(items))
    }

    /// List of strings, in order.
    pub fn string_list<S: AsRef<str>>(items: &[S]) -> Value {
        Value::list(items.iter().map(|s| Value::string(s.as_ref())).collect())
    }

    /// Name reported by `type()` and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Builtin(_) | Value::BoundMethod(_) => "builtin_function_or_method",
            Value::Struct(_) => "struct",
        }
    }

    pub fn truth(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.read().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod(_) | Value::Struct(_) => {
                true
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a list or tuple, copied out.
    pub fn as_sequence(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(l) => Some(l.read().clone()),
            Value::Tuple(t) => Some(t.to_vec()),
            _ => None,
        }
    }

    /// Elements of an iterable, copied out so the source may not change
    /// under the caller. Dicts yield their keys.
    pub fn iterate(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(l) => Ok(l.read().clone()),
            Value::Tuple(t) => Ok(t.to_vec()),
            Value::Dict(d) => Ok(d.keys()),
            other => Err(crate::errors::not_iterable(other.type_name())),
        }
    }

    /// Key used to index dicts. Only immutable values are hashable.
    pub fn hash_key(&self) -> Result<HashKey, EvalError> {
        match self {
            Value::None => Ok(HashKey::None),
            Value::Bool(b) => Ok(HashKey::Bool(*b)),
            Value::Int(n) => Ok(HashKey::Int(*n)),
            Value::Str(s) => Ok(HashKey::Str(Arc::clone(s))),
            Value::Tuple(items) => items
                .iter()
                .map(Value::hash_key)
                .collect::<Result<Vec<_>, _>>()
                .map(HashKey::Tuple),
            other => Err(unhashable(other.type_name())),
        }
    }

    /// Freeze this value and everything reachable from it.
    pub fn freeze(&self) {
        match self {
            Value::List(l) => {
                if !l.frozen.swap(true, AtomicOrdering::AcqRel) {
                    for item in l.items.read().iter() {
                        item.freeze();
                    }
                }
            }
            Value::Dict(d) => d.freeze(),
            Value::Tuple(items) => items.iter().for_each(Value::freeze),
            Value::Struct(s) => s.fields.iter().for_each(|(_, v)| v.freeze()),
            Value::Function(f) => f.defaults.iter().flatten().for_each(Value::freeze),
            Value::BoundMethod(m) => m.receiver.freeze(),
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Str(_) | Value::Builtin(_) => {}
        }
    }

    /// Ordering for `<`, `sorted`, `min` and `max`.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => compare_sequences(a, b),
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.read().clone(), b.read().clone());
                compare_sequences(&a, &b)
            }
            _ => Err(unsupported_operands(
                "<",
                self.type_name(),
                other.type_name(),
            )),
        }
    }

    /// Text form used by `str()` and `%s`: strings are not quoted.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    /// Text form used by `repr()` and `%r`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Str(s) => quote(s, out),
            Value::List(l) => {
                out.push('[');
                write_items(&l.read(), out);
                out.push(']');
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(d) => {
                out.push('{');
                for (i, (k, v)) in d.items().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_repr(out);
                    out.push_str(": ");
                    v.write_repr(out);
                }
                out.push('}');
            }
            Value::Function(f) => {
                out.push_str("<function ");
                out.push_str(f.name().as_str());
                out.push('>');
            }
            Value::Builtin(b) => {
                out.push_str("<built-in function ");
                out.push_str(b.name());
                out.push('>');
            }
            Value::BoundMethod(m) => {
                out.push_str("<built-in method ");
                out.push_str(m.name);
                out.push_str(" of ");
                out.push_str(m.receiver.type_name());
                out.push_str(" value>");
            }
            Value::Struct(s) => {
                out.push_str(&s.name);
                out.push('(');
                for (i, (k, v)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k.as_str());
                    out.push_str(" = ");
                    v.write_repr(out);
                }
                out.push(')');
            }
        }
    }
}

fn write_items(items: &[Value], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
}

fn quote(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Result<Ordering, EvalError> {
    for (x, y) in a.iter().zip(b) {
        if x != y {
            return x.compare(y);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b) || *a.read() == *b.read()
            }
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b) || a.items() == b.items(),
            (Value::Struct(a), Value::Struct(b)) => {
                Arc::ptr_eq(a, b) || (a.name == b.name && a.fields == b.fields)
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Arc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// Hashable projection of a value, used as a dict key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Tuple(Vec<HashKey>),
}

/// A mutable list.
pub struct List {
    items: RwLock<Vec<Value>>,
    frozen: AtomicBool,
}

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        List {
            items: RwLock::new(items),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.items.read()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(AtomicOrdering::Acquire)
    }

    /// Mutate in place; fails once frozen.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> Result<R, EvalError> {
        if self.is_frozen() {
            return Err(frozen("list"));
        }
        Ok(f(&mut self.items.write()))
    }
}

/// Signature shared by every host function.
pub type NativeFn = fn(&mut Thread, &Builtin, Arguments) -> Result<Value, EvalError>;

/// A host function callable from the language.
pub struct Builtin {
    name: String,
    func: NativeFn,
}

impl Builtin {
    pub fn new(name: impl Into<String>, func: NativeFn) -> Self {
        Builtin {
            name: name.into(),
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, thread: &mut Thread, args: Arguments) -> Result<Value, EvalError> {
        (self.func)(thread, self, args)
    }
}

/// Signature of a method on a built-in type.
pub type MethodFn = fn(&mut Thread, &Value, Arguments) -> Result<Value, EvalError>;

/// A method looked up on a receiver, e.g. `srcs.append`.
pub struct BoundMethod {
    pub receiver: Value,
    pub name: &'static str,
    pub(crate) func: MethodFn,
}

/// A function defined in the language by `def` or `lambda`.
pub struct Function {
    pub(crate) def: Arc<FunctionDef>,
    /// Module whose bindings and predeclared snapshot resolve free names.
    /// Weak, since the module's bindings hold this function.
    pub(crate) module: Weak<ModuleScope>,
    /// Evaluated default per parameter, `None` where there is none.
    pub(crate) defaults: Vec<Option<Value>>,
    /// Enclosing function locals visible to a nested function.
    pub(crate) captured: Arc<FxHashMap<Name, Value>>,
}

impl Function {
    pub fn name(&self) -> Name {
        self.def.name
    }
}

/// An immutable record with named fields, created by `struct()` or the host.
pub struct Struct {
    pub name: Arc<str>,
    fields: Vec<(Name, Value)>,
}

impl Struct {
    /// Fields in assignment order; a repeated name replaces the earlier value
    /// in place.
    pub fn new(name: &str, fields: impl IntoIterator<Item = (Name, Value)>) -> Self {
        let mut ordered: Vec<(Name, Value)> = Vec::new();
        for (k, v) in fields {
            match ordered.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => ordered.push((k, v)),
            }
        }
        Struct {
            name: Arc::from(name),
            fields: ordered,
        }
    }

    pub fn get(&self, name: Name) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(Name, Value)] {
        &self.fields
    }
}
