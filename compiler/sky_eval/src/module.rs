//! Module scopes and file execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use sky_ir::{Location, Name, Span};

use crate::errors::{frozen, syntax_error, EvalError};
use crate::eval::Eval;
use crate::{Globals, Thread, Value};

/// Top-level bindings of a module, in definition order.
///
/// Bindings returned by [`exec_file`] own the module that produced them.
/// Functions defined in the module only hold a weak reference to it, so
/// the module lives exactly as long as some copy of its bindings does
/// (directly, through [`Globals`], or through an importing module).
#[derive(Clone, Default)]
pub struct Bindings {
    values: FxHashMap<Name, Value>,
    order: Vec<Name>,
    owner: Option<Arc<ModuleScope>>,
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Bindings {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&Name::intern(name))
    }

    pub fn get_name(&self, name: Name) -> Option<&Value> {
        self.values.get(&name)
    }

    pub fn insert(&mut self, name: Name, value: Value) {
        if self.values.insert(name, value).is_none() {
            self.order.push(name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (*name, v)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.order.iter().map(|n| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The module these bindings were exported from, if any.
    pub fn owner(&self) -> Option<&Arc<ModuleScope>> {
        self.owner.as_ref()
    }
}

/// Scope of one executing file.
///
/// Free names in the file (and in functions it defines) resolve first in
/// the module's own bindings, then in `predeclared`, the globals snapshot
/// taken when execution started. Names added to the globals later are
/// never visible here.
pub struct ModuleScope {
    file: Arc<str>,
    source: Arc<str>,
    predeclared: Globals,
    bindings: RwLock<Bindings>,
    /// Modules whose values were copied into this one by `load` or
    /// `subinclude`.
    imports: Mutex<Vec<Arc<ModuleScope>>>,
    frozen: AtomicBool,
}

impl ModuleScope {
    fn new(file: Arc<str>, source: Arc<str>, predeclared: Globals) -> Self {
        ModuleScope {
            file,
            source,
            predeclared,
            bindings: RwLock::new(Bindings::default()),
            imports: Mutex::new(Vec::new()),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.bindings.read().get_name(name) {
            return Some(value.clone());
        }
        self.predeclared.get(name).cloned()
    }

    /// Bind a top-level name. Fails once the module has finished executing.
    pub fn define(&self, name: Name, value: Value) -> Result<(), EvalError> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(frozen("module"));
        }
        self.bindings.write().insert(name, value);
        Ok(())
    }

    /// Keep the module behind `bindings` alive for as long as this one.
    /// Call this before binding any of its values here.
    pub fn retain(&self, bindings: &Bindings) {
        if let Some(owner) = bindings.owner() {
            let mut imports = self.imports.lock();
            if !imports.iter().any(|m| Arc::ptr_eq(m, owner)) {
                imports.push(Arc::clone(owner));
            }
        }
    }

    pub fn location(&self, span: Span) -> Location {
        Location::resolve(Arc::clone(&self.file), &self.source, span)
    }

    fn freeze(self: &Arc<Self>) -> Bindings {
        self.frozen.store(true, Ordering::Release);
        let mut bindings = self.bindings.read().clone();
        for (_, value) in bindings.iter() {
            value.freeze();
        }
        bindings.owner = Some(Arc::clone(self));
        bindings
    }
}

/// Parse and execute `source` as file `file`.
///
/// Returns the file's top-level bindings, frozen. The predeclared globals
/// are read, never written.
pub fn exec_file(
    thread: &mut Thread,
    file: &str,
    source: &str,
    predeclared: &Globals,
) -> Result<Bindings, EvalError> {
    let file: Arc<str> = Arc::from(file);
    let ast = sky_syntax::parse(source).map_err(|e| {
        syntax_error(e.message.clone())
            .at(|| Location::resolve(Arc::clone(&file), source, e.span))
    })?;

    let scope = Arc::new(ModuleScope::new(
        Arc::clone(&file),
        Arc::from(source),
        predeclared.clone(),
    ));
    tracing::debug!(file = %file, thread = thread.name(), "executing file");

    thread.push_module(Arc::clone(&scope));
    let result = Eval::new(thread).exec_module(&scope, &ast.stmts);
    thread.pop_module();
    result?;

    Ok(scope.freeze())
}

#[cfg(test)]
mod tests;
