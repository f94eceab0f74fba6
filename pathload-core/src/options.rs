//! Per-request load options and results

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::LoadError;
use crate::lazy::LazyUnit;
use crate::package::PackageSpec;
use crate::unit::Unit;
use crate::value::{ExpectedType, Value};

/// A user-supplied preprocessing transform.
pub type UserPreprocessor = Rc<dyn Fn(&[u8], &Path) -> Result<Vec<u8>, LoadError>>;

/// Options of a single load request.
#[derive(Clone)]
pub struct LoadOptions {
    /// Consult and populate the load cache.
    pub use_cache: bool,
    /// Defer the load until first use.
    pub lazy: bool,
    /// Rewrite relative references in the loaded source (and in anything it
    /// loads through the emitted fallback chains).
    pub recurse: bool,
    /// Bindings seeded into the unit's environment before execution.
    pub inject: BTreeMap<String, Value>,
    /// Package context to load the unit under.
    pub package: Option<PackageSpec>,
    /// Consult and maintain on-disk preprocessing artifacts.
    pub use_preprocessor_cache: bool,
    /// Relocation prefix for preprocessing artifacts.
    pub cache_path_prefix: Option<PathBuf>,
    /// Path of the requesting source file; overrides the loader's caller
    /// locator for this request.
    pub caller: Option<PathBuf>,
    /// Human-readable reference to the requesting statement, echoed into
    /// diagnostics.
    pub caller_reference: Option<String>,
    /// User preprocessing transform, run before the rewriter.
    pub preprocessor: Option<UserPreprocessor>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            lazy: false,
            recurse: false,
            inject: BTreeMap::new(),
            package: None,
            use_preprocessor_cache: true,
            cache_path_prefix: None,
            caller: None,
            caller_reference: None,
            preprocessor: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn recurse(mut self) -> Self {
        self.recurse = true;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn no_preprocessor_cache(mut self) -> Self {
        self.use_preprocessor_cache = false;
        self
    }

    pub fn with_caller(mut self, caller: impl Into<PathBuf>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_caller_reference(mut self, reference: impl Into<String>) -> Self {
        self.caller_reference = Some(reference.into());
        self
    }

    pub fn with_package(mut self, package: PackageSpec) -> Self {
        self.package = Some(package);
        self
    }

    pub fn with_cache_path_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.cache_path_prefix = Some(prefix.into());
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: UserPreprocessor) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn inject(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inject.insert(name.into(), value);
        self
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("use_cache", &self.use_cache)
            .field("lazy", &self.lazy)
            .field("recurse", &self.recurse)
            .field("inject", &self.inject)
            .field("package", &self.package)
            .field("use_preprocessor_cache", &self.use_preprocessor_cache)
            .field("cache_path_prefix", &self.cache_path_prefix)
            .field("caller", &self.caller)
            .field("caller_reference", &self.caller_reference)
            .field("preprocessor", &self.preprocessor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Which symbols a load request wants out of the unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SymbolRequest {
    /// The whole unit.
    #[default]
    Whole,
    /// One named symbol.
    One(String),
    /// Several named symbols, in request order.
    Many(Vec<String>),
    /// Every public symbol.
    All,
    /// Named symbols with expected types, checked after extraction.
    Typed(Vec<(String, ExpectedType)>),
}

/// The result of a load request; its shape follows the symbol request.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Unit(Rc<Unit>),
    /// A lazily deferred unit.
    Deferred(Rc<LazyUnit>),
    Value(Value),
    Values(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl LoadOutcome {
    pub fn into_unit(self) -> Option<Rc<Unit>> {
        match self {
            LoadOutcome::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn into_deferred(self) -> Option<Rc<LazyUnit>> {
        match self {
            LoadOutcome::Deferred(lazy) => Some(lazy),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            LoadOutcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            LoadOutcome::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_mapping(self) -> Option<BTreeMap<String, Value>> {
        match self {
            LoadOutcome::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}
