//! The global namespace.
//!
//! `GlobalsBuilder` is filled during single-threaded startup: universe
//! builtins, host builtins, then the bindings of each rule-definition file.
//! `freeze` turns it into `Globals`, an immutable snapshot shared by
//! reference with every execution context.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sky_ir::Name;

use crate::module::ModuleScope;
use crate::value::{Builtin, NativeFn, Struct};
use crate::{Bindings, Value};

/// Immutable global namespace.
#[derive(Clone, Default)]
pub struct Globals {
    values: Arc<FxHashMap<Name, Value>>,
    /// Modules whose bindings were merged in; their functions resolve free
    /// names through them.
    modules: Arc<Vec<Arc<ModuleScope>>>,
}

impl Globals {
    fn new(values: FxHashMap<Name, Value>, modules: &[Arc<ModuleScope>]) -> Self {
        Globals {
            values: Arc::new(values),
            modules: Arc::new(modules.to_vec()),
        }
    }

    pub fn get(&self, name: Name) -> Option<&Value> {
        self.values.get(&name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&Name::intern(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Modules whose bindings were merged in, in merge order.
    pub fn modules(&self) -> &[Arc<ModuleScope>] {
        &self.modules
    }

    /// Global names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.values.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Mutable global namespace under construction.
#[derive(Default)]
pub struct GlobalsBuilder {
    values: FxHashMap<Name, Value>,
    modules: Vec<Arc<ModuleScope>>,
}

impl GlobalsBuilder {
    /// Empty namespace without the universe builtins.
    pub fn new() -> Self {
        GlobalsBuilder::default()
    }

    /// Namespace holding the language's universe builtins.
    pub fn standard() -> Self {
        let mut builder = GlobalsBuilder::new();
        crate::builtins::register_universe(&mut builder);
        builder
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(Name::intern(name), value);
    }

    pub fn set_builtin(&mut self, name: &str, func: NativeFn) {
        self.set(name, Value::Builtin(Arc::new(Builtin::new(name, func))));
    }

    /// A struct of builtins, e.g. `log.debug`.
    pub fn set_namespace(&mut self, name: &str, members: &[(&str, NativeFn)]) {
        let fields = members.iter().map(|(member, func)| {
            let builtin = Builtin::new(format!("{name}.{member}"), *func);
            (Name::intern(member), Value::Builtin(Arc::new(builtin)))
        });
        self.set(name, Value::Struct(Arc::new(Struct::new(name, fields))));
    }

    /// Merge module bindings; existing names are replaced.
    pub fn extend(&mut self, bindings: &Bindings) {
        if let Some(owner) = bindings.owner() {
            self.modules.push(Arc::clone(owner));
        }
        for (name, value) in bindings.iter() {
            self.values.insert(name, value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&Name::intern(name))
    }

    /// Frozen copy of the current contents. The builder stays usable.
    pub fn snapshot(&self) -> Globals {
        for value in self.values.values() {
            value.freeze();
        }
        Globals::new(self.values.clone(), &self.modules)
    }

    pub fn freeze(self) -> Globals {
        for value in self.values.values() {
            value.freeze();
        }
        Globals::new(self.values, &self.modules)
    }
}
