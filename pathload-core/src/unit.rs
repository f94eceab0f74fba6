//! Loaded units and the unit registry

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::env::Environment;
use crate::preprocess::ArtifactPaths;
use crate::value::Value;

/// Lifecycle state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Registered provisionally; execution has not finished.
    Loading,
    /// Execution completed successfully.
    Executed,
}

/// One loaded, executed piece of source code and its environment of bindings.
///
/// Units are owned by the [`UnitRegistry`] as `Rc<Unit>` once registered;
/// callers receive shared handles, never ownership.
#[derive(Debug)]
pub struct Unit {
    name: String,
    qualified_name: String,
    path: PathBuf,
    display_path: PathBuf,
    artifact: Option<ArtifactPaths>,
    package: Option<String>,
    state: Cell<UnitState>,
    env: RefCell<Environment>,
}

impl Unit {
    pub fn new(
        name: String,
        qualified_name: String,
        path: PathBuf,
        display_path: PathBuf,
        artifact: Option<ArtifactPaths>,
        package: Option<String>,
    ) -> Self {
        Self {
            name,
            qualified_name,
            path,
            display_path,
            artifact,
            package,
            state: Cell::new(UnitState::Loading),
            env: RefCell::new(Environment::new()),
        }
    }

    /// Sanitized base name of the unit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-joined package prefix plus unit name.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Canonical absolute path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path shown in diagnostics; the artifact display path when the unit was
    /// preprocessed, otherwise the source path.
    pub fn display_path(&self) -> &Path {
        &self.display_path
    }

    /// The backing preprocessing artifact, if any.
    pub fn artifact(&self) -> Option<&ArtifactPaths> {
        self.artifact.as_ref()
    }

    /// Package context the unit was loaded under, if any.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn state(&self) -> UnitState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: UnitState) {
        self.state.set(state);
    }

    /// Borrow the unit's environment.
    pub fn env(&self) -> Ref<'_, Environment> {
        self.env.borrow()
    }

    pub(crate) fn env_mut(&self) -> RefMut<'_, Environment> {
        self.env.borrow_mut()
    }

    /// Look up a binding in the unit's environment.
    pub fn symbol(&self, name: &str) -> Option<Value> {
        self.env.borrow().get(name)
    }
}

/// Registry of loaded units, keyed by qualified name.
///
/// This is the engine's analogue of a host-level module table; external
/// native-style references query it through the loader.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    by_name: HashMap<String, Rc<Unit>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its qualified name, handing back any previous
    /// holder of that name.
    pub fn register(&mut self, unit: Rc<Unit>) -> Option<Rc<Unit>> {
        self.by_name.insert(unit.qualified_name().to_string(), unit)
    }

    /// Remove a unit, but only if it is the registered instance.
    ///
    /// Failure rollback uses this so a failed load of one file cannot evict
    /// a healthy unit that happens to share the qualified name.
    pub fn remove_exact(&mut self, unit: &Rc<Unit>) -> bool {
        match self.by_name.get(unit.qualified_name()) {
            Some(current) if Rc::ptr_eq(current, unit) => {
                self.by_name.remove(unit.qualified_name());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, qualified_name: &str) -> Option<Rc<Unit>> {
        self.by_name.get(qualified_name).cloned()
    }

    /// Find a unit by its canonical source path.
    pub fn find_by_path(&self, path: &Path) -> Option<Rc<Unit>> {
        self.by_name.values().find(|u| u.path() == path).cloned()
    }

    /// All units loaded under the given package context.
    pub fn members_of(&self, package: &str) -> Vec<Rc<Unit>> {
        let mut members: Vec<Rc<Unit>> = self
            .by_name
            .values()
            .filter(|u| u.package() == Some(package))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));
        members
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
