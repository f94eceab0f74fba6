//! The loader engine
//!
//! `Loader` owns the virtual file system, the host runtime, the load cache,
//! the in-flight load stack, and the unit and package registries. It is a
//! cheap clone over shared state, so hosted code can carry a handle and
//! issue nested loads while an outer load is still executing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use std::cell::RefCell;

use tracing::{debug, trace, warn};

use pathload_vfs::VirtualFileSystem;

use crate::cache::{CacheKey, LoadCache, LoadStack, StackGuard};
use crate::config::LoaderConfig;
use crate::error::{
    CircularImportError, CodeInfo, ExecuteError, LoadError, ResolveError, RewrittenImportError,
    TypeMismatchError,
};
use crate::host::{CallerLocator, ExecContext, ExecuteFailure, HostRuntime};
use crate::lazy::{LazyCallable, LazyUnit};
use crate::options::{LoadOptions, LoadOutcome, SymbolRequest};
use crate::package::PackageNode;
use crate::preprocess;
use crate::resolver::{self, ResolvedPath};
use crate::rewrite::{self, Candidate};
use crate::unit::{Unit, UnitRegistry, UnitState};
use crate::value::{Callable, UnitRef, Value};

struct LoaderInner {
    vfs: Box<dyn VirtualFileSystem>,
    host: Box<dyn HostRuntime>,
    config: LoaderConfig,
    caller_locator: RefCell<Option<Box<dyn CallerLocator>>>,
    cache: RefCell<LoadCache>,
    stack: RefCell<LoadStack>,
    units: RefCell<UnitRegistry>,
    packages: RefCell<crate::package::PackageRegistry>,
    /// Directories registered as search roots for host-native references.
    native_search_paths: RefCell<Vec<PathBuf>>,
}

/// Shared handle to the loader engine.
#[derive(Clone)]
pub struct Loader {
    inner: Rc<LoaderInner>,
}

/// Result of servicing one fallback-chain directive.
#[derive(Debug, Clone)]
pub enum FallbackOutcome {
    /// A single symbol was extracted.
    Value(Value),
    /// A whole unit was bound.
    Unit(Rc<Unit>),
    /// A wildcard candidate matched; all public bindings.
    Bindings(BTreeMap<String, Value>),
}

impl Loader {
    pub fn new(
        vfs: Box<dyn VirtualFileSystem>,
        host: Box<dyn HostRuntime>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Rc::new(LoaderInner {
                vfs,
                host,
                config,
                caller_locator: RefCell::new(None),
                cache: RefCell::new(LoadCache::new()),
                stack: RefCell::new(LoadStack::new()),
                units: RefCell::new(UnitRegistry::new()),
                packages: RefCell::new(crate::package::PackageRegistry::new()),
                native_search_paths: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Install a fallback source for the caller's location, consulted when a
    /// request uses the directory placeholder without an explicit caller.
    pub fn set_caller_locator(&self, locator: Box<dyn CallerLocator>) {
        *self.inner.caller_locator.borrow_mut() = Some(locator);
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    pub fn vfs(&self) -> &dyn VirtualFileSystem {
        self.inner.vfs.as_ref()
    }

    /// Load a file and extract the requested symbols.
    pub fn load(
        &self,
        file_path: &str,
        symbols: SymbolRequest,
        options: LoadOptions,
    ) -> Result<LoadOutcome, LoadError> {
        let caller = options.caller.clone().or_else(|| {
            self.inner
                .caller_locator
                .borrow()
                .as_ref()
                .and_then(|locator| locator.caller_location())
        });

        let resolved = resolver::resolve(&self.inner.config, file_path, caller.as_deref())
            .map_err(|mut err| {
                err.caller_reference = options.caller_reference.clone();
                err
            })?;
        debug!(request = file_path, resolved = %resolved.resolved.display(), "load requested");

        if options.lazy {
            return self.load_deferred(file_path, resolved, symbols, options);
        }

        let package = match &options.package {
            Some(spec) => Some(spec.package_name(&resolved.resolved)?),
            None => None,
        };
        let qualified_name = match &package {
            Some(pkg) => format!("{}.{}", pkg, resolved.unit_name),
            None => resolved.unit_name.clone(),
        };
        let key = CacheKey::new(resolved.resolved.clone(), package.clone());

        // The in-flight stack is consulted before the cache: a provisional
        // cache entry exists while a unit executes, and handing it out to a
        // cyclic request would expose a half-built environment.
        {
            let stack = self.inner.stack.borrow();
            if stack.contains(&key) {
                let in_flight = stack
                    .top()
                    .map(|k| k.path.display().to_string())
                    .unwrap_or_default();
                return Err(CircularImportError {
                    file_path: file_path.to_string(),
                    file_path_resolved: resolved.resolved.clone(),
                    in_flight,
                    depth: stack.depth(),
                }
                .into());
            }
        }

        if options.use_cache {
            if let Some(unit) = self.inner.cache.borrow().get(&key) {
                trace!(resolved = %resolved.resolved.display(), "load cache hit");
                return self.extract(&unit, &symbols, file_path);
            }
        }

        let unit = {
            let _guard = StackGuard::enter(&self.inner.stack, key.clone());
            self.load_uncached(file_path, &resolved, &qualified_name, &package, &key, &options)?
        };
        self.extract(&unit, &symbols, file_path)
    }

    /// Convenience wrapper: load a file and return the whole unit.
    pub fn load_unit(
        &self,
        file_path: &str,
        options: LoadOptions,
    ) -> Result<Rc<Unit>, LoadError> {
        match self.load(file_path, SymbolRequest::Whole, options)? {
            LoadOutcome::Unit(unit) => Ok(unit),
            other => Err(LoadError::invalid_options(format!(
                "whole-unit load produced an unexpected outcome: {:?}",
                other
            ))),
        }
    }

    /// Convenience wrapper: load a file and return one symbol.
    pub fn load_symbol(
        &self,
        file_path: &str,
        symbol: &str,
        options: LoadOptions,
    ) -> Result<Value, LoadError> {
        match self.load(file_path, SymbolRequest::One(symbol.to_string()), options)? {
            LoadOutcome::Value(value) => Ok(value),
            other => Err(LoadError::invalid_options(format!(
                "single-symbol load produced an unexpected outcome: {:?}",
                other
            ))),
        }
    }

    fn load_deferred(
        &self,
        file_path: &str,
        resolved: ResolvedPath,
        symbols: SymbolRequest,
        options: LoadOptions,
    ) -> Result<LoadOutcome, LoadError> {
        // Resolution already happened against the requesting frame; the
        // proxy fires long after that frame is gone, so it replays the
        // absolute path, not the original request.
        let mut eager = options.clone();
        eager.lazy = false;
        let target = resolved.resolved.display().to_string();

        match symbols {
            SymbolRequest::Whole => {
                let loader = self.clone();
                let opts = eager;
                let lazy = LazyUnit::new(
                    file_path,
                    Box::new(move || loader.load_unit(&target, opts.clone())),
                );
                Ok(LoadOutcome::Deferred(Rc::new(lazy)))
            }
            SymbolRequest::Typed(requests) => {
                let mut values = Vec::with_capacity(requests.len());
                for (name, expected) in &requests {
                    if !matches!(expected, crate::value::ExpectedType::Callable) {
                        return Err(LoadError::invalid_options(
                            "lazy symbol loading requires callable-typed symbols",
                        ));
                    }
                    let loader = self.clone();
                    let path = target.clone();
                    let opts = eager.clone();
                    let symbol = name.clone();
                    let expected = expected.clone();
                    let lazy = LazyCallable::new(
                        name.clone(),
                        Box::new(move || {
                            let outcome = loader.load(
                                &path,
                                SymbolRequest::Typed(vec![(symbol.clone(), expected.clone())]),
                                opts.clone(),
                            )?;
                            match outcome.into_value().and_then(|v| v.as_callable()) {
                                Some(callable) => Ok(callable),
                                None => Err(LoadError::invalid_options(format!(
                                    "symbol '{}' did not produce a callable",
                                    symbol
                                ))),
                            }
                        }),
                    );
                    values.push(Value::Callable(Rc::new(lazy) as Rc<dyn Callable>));
                }
                if values.len() == 1 {
                    Ok(LoadOutcome::Value(values.remove(0)))
                } else {
                    Ok(LoadOutcome::Values(values))
                }
            }
            _ => Err(LoadError::invalid_options(
                "lazy loading supports whole units and callable-typed symbols only",
            )),
        }
    }

    fn load_uncached(
        &self,
        file_path: &str,
        resolved: &ResolvedPath,
        qualified_name: &str,
        package: &Option<String>,
        key: &CacheKey,
        options: &LoadOptions,
    ) -> Result<Rc<Unit>, LoadError> {
        self.check_loadable(file_path, resolved, options)?;

        if let Some(pkg) = package {
            let dir = resolved
                .resolved
                .parent()
                .unwrap_or(Path::new("/"))
                .to_path_buf();
            self.inner.packages.borrow_mut().ensure(pkg, &dir);
            let mut roots = self.inner.native_search_paths.borrow_mut();
            if !roots.contains(&dir) {
                roots.push(dir);
            }
        }

        let (source, display_path, artifact) = self.read_source(resolved, options)?;

        let compiled = self
            .inner
            .host
            .compile(&resolved.unit_name, &source, &display_path)
            .map_err(|failure| ExecuteError {
                file_path: file_path.to_string(),
                file_path_resolved: resolved.resolved.clone(),
                reason: format!("compilation failed: {}", failure.message),
                relative_reference: None,
            })?;

        let unit = Rc::new(Unit::new(
            resolved.unit_name.clone(),
            qualified_name.to_string(),
            resolved.resolved.clone(),
            display_path.clone(),
            artifact,
            package.clone(),
        ));
        {
            let mut env = unit.env_mut();
            env.set("__name__", Value::Str(qualified_name.to_string()));
            env.set(
                "__file__",
                Value::Str(resolved.resolved.display().to_string()),
            );
            env.set("__unit__", Value::Unit(UnitRef::new(&unit)));
            env.merge(options.inject.clone().into_iter());
        }

        // Provisional registration: nested non-cyclic loads issued during
        // execution can already see the unit. Rolled back on failure, with
        // any displaced same-name unit reinstated.
        let displaced = self.inner.units.borrow_mut().register(unit.clone());
        if options.use_cache {
            self.inner.cache.borrow_mut().insert(key.clone(), unit.clone());
        }

        let result = {
            let mut env = unit.env_mut();
            let mut ctx = ExecContext {
                loader: self,
                env: &mut env,
                path: &resolved.resolved,
                qualified_name,
            };
            self.inner.host.execute(compiled.as_ref(), &mut ctx)
        };

        match result {
            Ok(()) => {
                unit.set_state(UnitState::Executed);
                debug!(unit = qualified_name, "load complete");
                Ok(unit)
            }
            Err(failure) => {
                warn!(unit = qualified_name, error = %failure, "execution failed, rolling back");
                {
                    let mut units = self.inner.units.borrow_mut();
                    units.remove_exact(&unit);
                    if let Some(previous) = displaced {
                        units.register(previous);
                    }
                }
                if options.use_cache {
                    self.inner.cache.borrow_mut().remove(key);
                }
                Err(self.classify_failure(file_path, resolved, failure))
            }
        }
    }

    fn classify_failure(
        &self,
        file_path: &str,
        resolved: &ResolvedPath,
        failure: ExecuteFailure,
    ) -> LoadError {
        match failure {
            // Nested load errors keep their own kind.
            ExecuteFailure::Load(inner) => *inner,
            ExecuteFailure::RelativeReference { kind, statement } => ExecuteError {
                file_path: file_path.to_string(),
                file_path_resolved: resolved.resolved.clone(),
                reason: format!("unhandled relative reference: {}", statement),
                relative_reference: Some(kind),
            }
            .into(),
            other => ExecuteError {
                file_path: file_path.to_string(),
                file_path_resolved: resolved.resolved.clone(),
                reason: other.to_string(),
                relative_reference: None,
            }
            .into(),
        }
    }

    fn check_loadable(
        &self,
        file_path: &str,
        resolved: &ResolvedPath,
        options: &LoadOptions,
    ) -> Result<(), LoadError> {
        let vfs = self.inner.vfs.as_ref();
        let path = &resolved.resolved;

        if !vfs.exists(path) {
            let with_ext = PathBuf::from(format!(
                "{}.{}",
                path.display(),
                self.inner.config.source_extension
            ));
            let suggested = vfs.is_file(&with_ext).then_some(with_ext);
            return Err(ResolveError {
                file_path: file_path.to_string(),
                file_path_resolved: path.clone(),
                reason: String::from("File does not exist."),
                suggested_path: suggested,
                caller_reference: options.caller_reference.clone(),
            }
            .into());
        }
        if !vfs.is_file(path) {
            return Err(ResolveError {
                file_path: file_path.to_string(),
                file_path_resolved: path.clone(),
                reason: String::from("Object exists but is not a file."),
                suggested_path: None,
                caller_reference: options.caller_reference.clone(),
            }
            .into());
        }
        if !vfs.is_readable(path) {
            return Err(ResolveError {
                file_path: file_path.to_string(),
                file_path_resolved: path.clone(),
                reason: String::from("File exists but no read access."),
                suggested_path: None,
                caller_reference: options.caller_reference.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn read_source(
        &self,
        resolved: &ResolvedPath,
        options: &LoadOptions,
    ) -> Result<(Vec<u8>, PathBuf, Option<preprocess::ArtifactPaths>), LoadError> {
        let needs_preprocessing = options.preprocessor.is_some() || options.recurse;
        if !needs_preprocessing {
            let source = self.inner.vfs.read_file(&resolved.resolved)?;
            return Ok((source, resolved.resolved.clone(), None));
        }

        let config = &self.inner.config;
        let user = options.preprocessor.clone();
        let recurse = options.recurse;
        let pipeline = move |bytes: &[u8], path: &Path| -> Result<Vec<u8>, LoadError> {
            let bytes = match &user {
                Some(pre) => pre(bytes, path)?,
                None => bytes.to_vec(),
            };
            if recurse {
                Ok(rewrite::rewrite_source(&bytes, path, config)?)
            } else {
                Ok(bytes)
            }
        };

        let (bytes, paths) = preprocess::process(
            self.inner.vfs.as_ref(),
            config,
            &resolved.resolved,
            &pipeline,
            options.use_preprocessor_cache,
            options.cache_path_prefix.as_deref(),
        )?;
        let display = paths.display.clone();
        Ok((bytes, display, Some(paths)))
    }

    fn extract(
        &self,
        unit: &Rc<Unit>,
        symbols: &SymbolRequest,
        file_path: &str,
    ) -> Result<LoadOutcome, LoadError> {
        let missing = |name: &str| -> LoadError {
            ResolveError {
                file_path: file_path.to_string(),
                file_path_resolved: unit.path().to_path_buf(),
                reason: format!("cannot import name '{}' (unknown location)", name),
                suggested_path: None,
                caller_reference: None,
            }
            .into()
        };

        match symbols {
            SymbolRequest::Whole => Ok(LoadOutcome::Unit(unit.clone())),
            SymbolRequest::One(name) => {
                let value = unit.symbol(name).ok_or_else(|| missing(name))?;
                Ok(LoadOutcome::Value(value))
            }
            SymbolRequest::Many(names) => {
                let mut values = Vec::with_capacity(names.len());
                for name in names {
                    values.push(unit.symbol(name).ok_or_else(|| missing(name))?);
                }
                Ok(LoadOutcome::Values(values))
            }
            SymbolRequest::All => {
                let mapping: BTreeMap<String, Value> = unit
                    .env()
                    .public_bindings()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                Ok(LoadOutcome::Mapping(mapping))
            }
            SymbolRequest::Typed(requests) => {
                let mut values = Vec::with_capacity(requests.len());
                for (name, expected) in requests {
                    let value = unit.symbol(name).ok_or_else(|| missing(name))?;
                    if !expected.matches(&value) {
                        return Err(TypeMismatchError {
                            symbol: name.clone(),
                            expected: expected.describe(),
                            found: value.type_name().to_string(),
                            file_path: file_path.to_string(),
                            file_path_resolved: unit.path().to_path_buf(),
                        }
                        .into());
                    }
                    values.push(value);
                }
                if values.len() == 1 {
                    Ok(LoadOutcome::Value(values.remove(0)))
                } else {
                    Ok(LoadOutcome::Values(values))
                }
            }
        }
    }

    /// Service one rewritten fallback chain: try each candidate in order and
    /// bind the first that resolves.
    ///
    /// Only resolve failures advance the chain; an execution or type failure
    /// in a candidate that does exist is a real error and propagates.
    pub fn load_fallback(
        &self,
        candidates: &[Candidate],
        object_to_import: &str,
        caller: &Path,
        origin: CodeInfo,
    ) -> Result<FallbackOutcome, LoadError> {
        let mut attempts = Vec::new();
        for candidate in candidates {
            let options = LoadOptions::new()
                .recurse()
                .with_caller(caller)
                .with_caller_reference(format!(
                    "{} @ {}:{}",
                    origin.source, origin.line, origin.offset
                ));
            let request = match candidate.symbol.as_deref() {
                Some("*") => SymbolRequest::All,
                Some(symbol) => SymbolRequest::One(symbol.to_string()),
                None => SymbolRequest::Whole,
            };
            match self.load(&candidate.path, request, options) {
                Ok(LoadOutcome::Mapping(bindings)) => {
                    return Ok(FallbackOutcome::Bindings(bindings))
                }
                Ok(LoadOutcome::Value(value)) => return Ok(FallbackOutcome::Value(value)),
                Ok(LoadOutcome::Unit(unit)) => return Ok(FallbackOutcome::Unit(unit)),
                Ok(_) => {
                    return Err(LoadError::invalid_options(
                        "fallback candidate produced an unexpected outcome",
                    ))
                }
                Err(LoadError::Resolve(err)) => {
                    trace!(candidate = %candidate.path, "fallback candidate failed to resolve");
                    attempts.push(err);
                }
                Err(other) => return Err(other),
            }
        }
        Err(RewrittenImportError {
            object_to_import: object_to_import.to_string(),
            code_info: origin,
            attempts,
        }
        .into())
    }

    // Introspection

    /// A loaded unit by qualified name.
    pub fn unit(&self, qualified_name: &str) -> Option<Rc<Unit>> {
        self.inner.units.borrow().get(qualified_name)
    }

    /// A cached unit by canonical path and package context.
    pub fn cached_unit(&self, path: &Path, package: Option<&str>) -> Option<Rc<Unit>> {
        self.inner
            .cache
            .borrow()
            .get(&CacheKey::new(path.to_path_buf(), package.map(str::to_string)))
    }

    /// A synthesized package by dotted name.
    pub fn package(&self, dotted: &str) -> Option<PackageNode> {
        self.inner.packages.borrow().get(dotted).cloned()
    }

    /// Units loaded under a package context.
    pub fn package_members(&self, dotted: &str) -> Vec<Rc<Unit>> {
        self.inner.units.borrow().members_of(dotted)
    }

    /// Directories registered for host-native lookups, in registration
    /// order.
    pub fn native_search_paths(&self) -> Vec<PathBuf> {
        self.inner.native_search_paths.borrow().clone()
    }

    pub fn load_stack_depth(&self) -> usize {
        self.inner.stack.borrow().depth()
    }

    pub fn cache_len(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }
}
