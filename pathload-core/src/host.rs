//! Host runtime boundary
//!
//! Compilation and execution of hosted source code is opaque to the engine.
//! The engine hands the host raw bytes and a display path, receives back an
//! opaque compiled artifact, and later asks the host to execute it against an
//! [`Environment`]. Everything the engine knows about a failed execution is
//! carried in [`ExecuteFailure`].

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::error::LoadError;
use crate::loader::Loader;

/// Opaque compiled form of a unit's source, produced by the host.
pub trait CompiledUnit {
    /// Downcast hook for host implementations.
    fn as_any(&self) -> &dyn Any;
}

/// Compilation failure reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub message: String,
}

impl CompileFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The kind of relative reference the host tripped over.
///
/// Distinguishes "this unit has no package context at all" from "the
/// reference climbs above the top-level package".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeRefKind {
    /// A relative reference in a unit loaded without package context.
    NoParentPackage,
    /// A relative reference that climbs beyond the top-level package.
    BeyondTopLevel,
}

/// Failure reported by the host while executing a compiled unit.
#[derive(Debug)]
pub enum ExecuteFailure {
    /// A generic runtime error inside the hosted code.
    Runtime { message: String },
    /// The hosted code contained a relative reference the host could not
    /// satisfy. The engine turns this into a diagnostic suggesting the
    /// rewriter or a package context.
    RelativeReference {
        kind: RelativeRefKind,
        statement: String,
    },
    /// The hosted code referenced a name that is not bound.
    MissingSymbol { name: String },
    /// A nested load issued from inside the executing unit failed.
    Load(Box<LoadError>),
}

impl ExecuteFailure {
    pub fn runtime(message: impl Into<String>) -> Self {
        ExecuteFailure::Runtime {
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecuteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteFailure::Runtime { message } => write!(f, "{}", message),
            ExecuteFailure::RelativeReference { statement, .. } => {
                write!(f, "unresolvable relative reference: {}", statement)
            }
            ExecuteFailure::MissingSymbol { name } => {
                write!(f, "name '{}' is not bound", name)
            }
            ExecuteFailure::Load(err) => write!(f, "{}", err),
        }
    }
}

impl From<LoadError> for ExecuteFailure {
    fn from(err: LoadError) -> Self {
        ExecuteFailure::Load(Box::new(err))
    }
}

/// Execution context handed to the host alongside a compiled unit.
///
/// Carries the loader handle so hosted code can issue nested loads, which is
/// how fallback-chain directives emitted by the rewriter are serviced.
pub struct ExecContext<'a> {
    pub loader: &'a Loader,
    pub env: &'a mut Environment,
    pub path: &'a Path,
    pub qualified_name: &'a str,
}

/// The host language runtime: compiles source bytes and executes the result.
pub trait HostRuntime {
    /// Compile source bytes into an opaque unit.
    ///
    /// # Arguments
    /// * `name` - sanitized unit name
    /// * `source` - raw (possibly preprocessed) source bytes
    /// * `display_path` - path to attribute in host-side diagnostics
    fn compile(
        &self,
        name: &str,
        source: &[u8],
        display_path: &Path,
    ) -> Result<Box<dyn CompiledUnit>, CompileFailure>;

    /// Execute a compiled unit, populating `ctx.env` with its bindings.
    fn execute(
        &self,
        compiled: &dyn CompiledUnit,
        ctx: &mut ExecContext<'_>,
    ) -> Result<(), ExecuteFailure>;
}

/// Resolves the location of the code requesting a load.
///
/// The engine consults this when a request uses the directory placeholder but
/// no explicit caller path was supplied.
pub trait CallerLocator {
    /// Path of the source file the current request originates from, if it
    /// can be determined.
    fn caller_location(&self) -> Option<PathBuf>;
}

/// A locator pinned to a fixed path.
pub struct StaticCaller(pub PathBuf);

impl CallerLocator for StaticCaller {
    fn caller_location(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_caller() {
        let locator = StaticCaller(PathBuf::from("/app/main.py"));
        assert_eq!(locator.caller_location(), Some(PathBuf::from("/app/main.py")));
    }

    #[test]
    fn test_execute_failure_display() {
        let failure = ExecuteFailure::runtime("division by zero");
        assert_eq!(failure.to_string(), "division by zero");

        let failure = ExecuteFailure::MissingSymbol {
            name: String::from("logger"),
        };
        assert_eq!(failure.to_string(), "name 'logger' is not bound");

        let failure = ExecuteFailure::RelativeReference {
            kind: RelativeRefKind::NoParentPackage,
            statement: String::from("from . import x"),
        };
        assert!(failure.to_string().contains("from . import x"));
    }
}
