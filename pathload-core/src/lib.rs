//! pathload-core: the loader engine
//!
//! Loads hosted source files by file system path instead of by name lookup:
//! resolve the request (placeholder expansion, normalization), consult the
//! load cache and the in-flight stack, preprocess and rewrite the source if
//! asked, hand the bytes to the host runtime for compilation and execution,
//! and extract the requested symbols from the resulting unit.
//!
//! The host language itself is opaque: anything that can compile bytes and
//! execute the result against an [`Environment`](env::Environment)
//! implements [`HostRuntime`](host::HostRuntime) and plugs in.

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod host;
pub mod lazy;
pub mod loader;
pub mod options;
pub mod package;
pub mod preprocess;
pub mod resolver;
pub mod rewrite;
pub mod unit;
pub mod value;

pub use config::LoaderConfig;
pub use diagnostics::{Diagnostic, Suggestion};
pub use env::Environment;
pub use error::{
    CircularImportError, CodeInfo, ExecuteError, LoadError, ResolveError, RewriteError,
    RewrittenImportError, TypeMismatchError,
};
pub use host::{
    CallerLocator, CompileFailure, CompiledUnit, ExecContext, ExecuteFailure, HostRuntime,
    RelativeRefKind, StaticCaller,
};
pub use lazy::{LazyCallable, LazyUnit};
pub use loader::{FallbackOutcome, Loader};
pub use options::{LoadOptions, LoadOutcome, SymbolRequest};
pub use package::{PackageNode, PackageSpec};
pub use unit::{Unit, UnitState};
pub use value::{Callable, ExpectedType, UnitRef, Value};
