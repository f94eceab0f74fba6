//! Unit execution environments
//!
//! An environment is the explicit key-value namespace a unit's execution
//! populates. The engine seeds it with the well-known bindings (`__name__`,
//! `__file__`, `__unit__`) and any injected dependencies before execution.

use std::collections::BTreeMap;

use crate::value::Value;

/// An ordered namespace of named bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    /// Create or replace a binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// All bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    /// Public bindings: everything whose name does not start with `__`.
    ///
    /// This is the set a wildcard import selects.
    pub fn public_bindings(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter().filter(|(name, _)| !name.starts_with("__"))
    }

    /// Merge a set of bindings into this environment, replacing collisions.
    pub fn merge(&mut self, bindings: impl IntoIterator<Item = (String, Value)>) {
        for (name, value) in bindings {
            self.bindings.insert(name, value);
        }
    }
}
