//! Execution context.
//!
//! A `Thread` is everything one evaluation needs besides the code and the
//! globals: the call stack (for the recursion ban and error backtraces),
//! the stack of modules being executed, the stack of in-progress loads,
//! the module-loading hook, the log sink, and typed context-local slots
//! the host uses to pass per-evaluation state to its builtins.
//!
//! A thread is used by one worker at a time and reused across evaluations;
//! slots keep their contents until overwritten or cleared.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sky_ir::ast::FunctionDef;

use crate::errors::{load_error, recursion, EvalError};
use crate::log_sink::{tracing_sink, SharedLogSink};
use crate::module::ModuleScope;
use crate::Bindings;

/// Resolves `load()` and host include requests to module bindings.
pub trait Loader: Send + Sync {
    /// Load `module` as written by the caller and return its frozen
    /// top-level bindings. Runs on the requesting thread.
    fn load(&self, thread: &mut Thread, module: &str) -> Result<Arc<Bindings>, EvalError>;
}

type Slot = Arc<dyn Any + Send + Sync>;

pub struct Thread {
    name: String,
    locals: FxHashMap<&'static str, Slot>,
    call_stack: Vec<Arc<FunctionDef>>,
    modules: Vec<Arc<ModuleScope>>,
    loads: Vec<String>,
    loader: Option<Arc<dyn Loader>>,
    log: SharedLogSink,
}

impl Thread {
    pub fn new(name: impl Into<String>) -> Self {
        Thread {
            name: name.into(),
            locals: FxHashMap::default(),
            call_stack: Vec::new(),
            modules: Vec::new(),
            loads: Vec::new(),
            loader: None,
            log: tracing_sink(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // === Context-local slots ===

    pub fn set_local<T: Any + Send + Sync>(&mut self, key: &'static str, value: Arc<T>) {
        self.locals.insert(key, value);
    }

    /// The slot's value if set and of type `T`.
    pub fn local<T: Any + Send + Sync>(&self, key: &'static str) -> Option<Arc<T>> {
        let slot = Arc::clone(self.locals.get(key)?);
        slot.downcast::<T>().ok()
    }

    pub fn clear_local(&mut self, key: &'static str) {
        self.locals.remove(key);
    }

    // === Hooks ===

    pub fn set_loader(&mut self, loader: Arc<dyn Loader>) {
        self.loader = Some(loader);
    }

    pub fn set_log_sink(&mut self, log: SharedLogSink) {
        self.log = log;
    }

    pub fn log_sink(&self) -> &SharedLogSink {
        &self.log
    }

    /// Load a module through the installed loader.
    pub fn load(&mut self, module: &str) -> Result<Arc<Bindings>, EvalError> {
        let Some(loader) = self.loader.clone() else {
            return Err(load_error(module, "no module loader installed"));
        };
        loader.load(self, module)
    }

    /// Mark `key` as being loaded; fails if it already is (a load cycle).
    pub fn enter_load(&mut self, key: &str) -> Result<(), EvalError> {
        if let Some(pos) = self.loads.iter().position(|k| k == key) {
            let mut chain: Vec<&str> = self.loads[pos..].iter().map(String::as_str).collect();
            chain.push(key);
            return Err(load_error(
                key,
                format!("cycle in load graph: {}", chain.join(" -> ")),
            ));
        }
        self.loads.push(key.to_string());
        Ok(())
    }

    pub fn exit_load(&mut self) {
        self.loads.pop();
    }

    // === Execution state ===

    /// The module currently being executed (innermost `exec_file`).
    pub fn current_module(&self) -> Option<&Arc<ModuleScope>> {
        self.modules.last()
    }

    pub(crate) fn push_module(&mut self, module: Arc<ModuleScope>) {
        self.modules.push(module);
    }

    pub(crate) fn pop_module(&mut self) {
        self.modules.pop();
    }

    /// Push a call frame. A function already on the stack may not be
    /// entered again.
    pub(crate) fn enter_call(&mut self, def: &Arc<FunctionDef>) -> Result<(), EvalError> {
        if self.call_stack.iter().any(|f| Arc::ptr_eq(f, def)) {
            return Err(recursion(def.name));
        }
        self.call_stack.push(Arc::clone(def));
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.call_stack.pop();
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("name", &self.name)
            .field("locals", &self.locals.keys().collect::<Vec<_>>())
            .field("call_depth", &self.call_stack.len())
            .field("loads", &self.loads)
            .finish_non_exhaustive()
    }
}
