//! Insertion-ordered dictionary.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{HashKey, Value};
use crate::errors::{frozen, EvalError};

#[derive(Default)]
struct Entries {
    items: Vec<(Value, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl Entries {
    fn reindex(&mut self) -> Result<(), EvalError> {
        self.index.clear();
        for (i, (k, _)) in self.items.iter().enumerate() {
            self.index.insert(k.hash_key()?, i);
        }
        Ok(())
    }
}

/// A mutable dict that iterates in insertion order.
#[derive(Default)]
pub struct Dict {
    entries: RwLock<Entries>,
    frozen: AtomicBool,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    /// Build from pairs; later duplicates overwrite earlier values.
    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Result<Self, EvalError> {
        let dict = Dict::new();
        for (k, v) in pairs {
            dict.insert(k, v)?;
        }
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.entries.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub(crate) fn freeze(&self) {
        if self.frozen.swap(true, Ordering::AcqRel) {
            return;
        }
        for (k, v) in &self.entries.read().items {
            k.freeze();
            v.freeze();
        }
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        let key = key.hash_key()?;
        let entries = self.entries.read();
        Ok(entries
            .index
            .get(&key)
            .map(|&i| entries.items[i].1.clone()))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, EvalError> {
        let key = key.hash_key()?;
        Ok(self.entries.read().index.contains_key(&key))
    }

    pub fn insert(&self, key: Value, value: Value) -> Result<(), EvalError> {
        if self.is_frozen() {
            return Err(frozen("dict"));
        }
        let hash = key.hash_key()?;
        let mut entries = self.entries.write();
        match entries.index.get(&hash).copied() {
            Some(i) => entries.items[i].1 = value,
            None => {
                let i = entries.items.len();
                entries.items.push((key, value));
                entries.index.insert(hash, i);
            }
        }
        Ok(())
    }

    pub fn remove(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        if self.is_frozen() {
            return Err(frozen("dict"));
        }
        let hash = key.hash_key()?;
        let mut entries = self.entries.write();
        let Some(i) = entries.index.get(&hash).copied() else {
            return Ok(None);
        };
        let (_, value) = entries.items.remove(i);
        entries.reindex()?;
        Ok(Some(value))
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries
            .read()
            .items
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries
            .read()
            .items
            .iter()
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn items(&self) -> Vec<(Value, Value)> {
        self.entries.read().items.clone()
    }
}
