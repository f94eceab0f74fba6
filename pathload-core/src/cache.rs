//! Load cache and in-flight load stack
//!
//! The cache is keyed by canonical path plus package context, so the same
//! file loaded under two packages yields two distinct units. The stack holds
//! every load currently executing; a request already on the stack is a
//! circular load. [`StackGuard`] ties the push/pop to a scope so the stack
//! never leaks entries on error paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::unit::Unit;

/// Identity of a load: canonical path plus package context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub package: Option<String>,
}

impl CacheKey {
    pub fn new(path: PathBuf, package: Option<String>) -> Self {
        Self { path, package }
    }
}

/// Cache of completed (and provisionally registered) loads.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<CacheKey, Rc<Unit>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Rc<Unit>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: CacheKey, unit: Rc<Unit>) {
        self.entries.insert(key, unit);
    }

    /// Drop an entry; used by failure rollback.
    pub fn remove(&mut self, key: &CacheKey) -> Option<Rc<Unit>> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The stack of loads currently in flight.
#[derive(Debug, Default)]
pub struct LoadStack {
    entries: Vec<CacheKey>,
}

impl LoadStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// The load currently executing, if any.
    pub fn top(&self) -> Option<&CacheKey> {
        self.entries.last()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    fn push(&mut self, key: CacheKey) {
        self.entries.push(key);
    }

    fn remove(&mut self, key: &CacheKey) {
        if let Some(pos) = self.entries.iter().rposition(|k| k == key) {
            self.entries.remove(pos);
        }
    }
}

/// Scope guard for one in-flight load.
///
/// Pushes the key on construction and removes it on drop, so the stack is
/// released whether the load completes, fails, or unwinds.
pub struct StackGuard<'a> {
    stack: &'a RefCell<LoadStack>,
    key: CacheKey,
}

impl<'a> StackGuard<'a> {
    pub fn enter(stack: &'a RefCell<LoadStack>, key: CacheKey) -> Self {
        stack.borrow_mut().push(key.clone());
        Self { stack, key }
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().remove(&self.key);
    }
}
