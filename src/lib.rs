//! pathload - load source files by file system path
//!
//! Instead of resolving names against a search path, pathload takes the path
//! itself: hand it a file, get back an executed unit and its bindings. The
//! engine handles placeholder expansion, load caching, circular-load
//! detection, preprocessing with on-disk artifacts, relative-reference
//! rewriting, lazy proxies and virtual packages; the host language plugs in
//! behind [`HostRuntime`].
//!
//! # Architecture
//!
//! ```text
//! pathload-vfs/   - file system seam (memory and native backends)
//! pathload-core/  - the loader engine
//! src/            - this facade: re-exports and tracing setup
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use pathload::{Loader, LoaderConfig, LoadOptions, native_fs};
//!
//! let loader = Loader::new(Box::new(native_fs()), host, LoaderConfig::default());
//! let unit = loader.load_unit("__dir__/sibling.py", LoadOptions::new().with_caller(file!()))?;
//! ```

pub use pathload_core::{
    Callable, CallerLocator, CircularImportError, CodeInfo, CompileFailure, CompiledUnit,
    Diagnostic, Environment, ExecContext, ExecuteError, ExecuteFailure, ExpectedType,
    FallbackOutcome,
    HostRuntime, LazyCallable, LazyUnit, LoadError, LoadOptions, LoadOutcome, Loader,
    LoaderConfig, PackageNode, PackageSpec, RelativeRefKind, ResolveError, RewriteError,
    RewrittenImportError, StaticCaller, Suggestion, SymbolRequest, TypeMismatchError, Unit,
    UnitRef, UnitState, Value,
};
pub use pathload_vfs::{
    memory_fs, native_fs, MemoryFileSystem, NativeFileSystem, VfsError, VirtualFileSystem,
};

/// Install a tracing subscriber filtered by `RUST_LOG`.
///
/// Intended for binaries and examples embedding the loader; libraries should
/// leave subscriber choice to their host. Calling it twice is harmless, the
/// second call is ignored.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
