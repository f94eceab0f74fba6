//! Error taxonomy of the loader engine
//!
//! Every failure mode is a dedicated type carrying the data needed to render
//! a structured diagnostic: the path as requested, the path as resolved, and
//! kind-specific context. [`LoadError`] is the umbrella the public API
//! returns.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use pathload_vfs::VfsError;

use crate::diagnostics::{Diagnostic, Suggestion};
use crate::host::RelativeRefKind;

/// Location of a statement in hosted source, carried through the rewriter so
/// a failing fallback chain can point back at the original line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeInfo {
    /// The original statement text.
    pub source: String,
    /// File the statement came from.
    pub file_path: PathBuf,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column offset.
    pub offset: u32,
}

/// A request that could not be resolved to a loadable file.
#[derive(Debug, Clone, Error)]
#[error("could not resolve '{file_path}': {reason}")]
pub struct ResolveError {
    /// The path as requested, before placeholder expansion.
    pub file_path: String,
    /// The path after expansion and normalization.
    pub file_path_resolved: PathBuf,
    pub reason: String,
    /// A nearby path that does exist, if one was found.
    pub suggested_path: Option<PathBuf>,
    /// Code reference of the requesting statement, when known.
    pub caller_reference: Option<String>,
}

impl ResolveError {
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new("ResolveError", &self.reason);
        diag.row("file_path", &self.file_path);
        diag.row("file_path_resolved", self.file_path_resolved.display());
        if let Some(reference) = &self.caller_reference {
            diag.row("requested_from", reference);
        }
        if let Some(suggested) = &self.suggested_path {
            diag.suggest(Suggestion::new(format!(
                "Did you mean to load '{}'?",
                suggested.display()
            )));
        }
        diag
    }
}

/// A load request for a file that is already being loaded.
#[derive(Debug, Clone, Error)]
#[error("circular load of '{file_path}' (requested while '{in_flight}' is still loading)")]
pub struct CircularImportError {
    pub file_path: String,
    pub file_path_resolved: PathBuf,
    /// The in-flight load that issued this request.
    pub in_flight: String,
    /// Depth of the load stack at detection time.
    pub depth: usize,
}

impl CircularImportError {
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new(
            "CircularImportError",
            "This file is already being loaded; the request would recurse forever.",
        );
        diag.row("file_path", &self.file_path);
        diag.row("file_path_resolved", self.file_path_resolved.display());
        diag.row("requested_while_loading", &self.in_flight);
        diag.row("load_stack_depth", self.depth);
        diag.suggest(Suggestion::new(
            "Break the cycle with a lazy load: defer one side until first use.",
        ));
        diag
    }
}

/// The host failed to compile or execute a unit.
#[derive(Debug, Clone, Error)]
#[error("execution of '{file_path}' failed: {reason}")]
pub struct ExecuteError {
    pub file_path: String,
    pub file_path_resolved: PathBuf,
    pub reason: String,
    /// Present when the failure was an unresolvable relative reference.
    pub relative_reference: Option<RelativeRefKind>,
}

impl ExecuteError {
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new("ExecuteError", &self.reason);
        diag.row("file_path", &self.file_path);
        diag.row("file_path_resolved", self.file_path_resolved.display());
        match self.relative_reference {
            Some(RelativeRefKind::NoParentPackage) => {
                diag.suggest(Suggestion::new(
                    "Load this file with the rewriter enabled, or give it a package context.",
                ));
            }
            Some(RelativeRefKind::BeyondTopLevel) => {
                diag.suggest(Suggestion::new(
                    "The reference climbs above the top-level package; deepen the package context.",
                ));
            }
            None => {}
        }
        diag
    }
}

/// Every candidate of a rewritten fallback chain failed to resolve.
#[derive(Debug, Clone, Error)]
#[error("cannot import '{object_to_import}' (no candidate resolved)")]
pub struct RewrittenImportError {
    /// The name the original statement wanted to bind.
    pub object_to_import: String,
    /// Location of the original statement.
    pub code_info: CodeInfo,
    /// The resolve failure of each candidate, in attempt order.
    pub attempts: Vec<ResolveError>,
}

impl RewrittenImportError {
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new(
            "RewrittenImportError",
            "A rewritten relative reference exhausted all of its candidates.",
        );
        diag.row("object_to_import", &self.object_to_import);
        diag.row("statement", &self.code_info.source);
        diag.row(
            "location",
            format!(
                "{}:{}:{}",
                self.code_info.file_path.display(),
                self.code_info.line,
                self.code_info.offset
            ),
        );
        for (i, attempt) in self.attempts.iter().enumerate() {
            diag.row(
                format!("candidate {}", i + 1),
                attempt.file_path_resolved.display(),
            );
        }
        diag.suggest(Suggestion::new(
            "Check that the referenced sibling file exists next to the original statement.",
        ));
        diag
    }
}

/// A requested symbol exists but its runtime type does not match the request.
#[derive(Debug, Clone, Error)]
#[error("symbol '{symbol}' has type '{found}', expected '{expected}'")]
pub struct TypeMismatchError {
    pub symbol: String,
    /// Description of the expected type.
    pub expected: String,
    /// Runtime type name of the value actually found.
    pub found: String,
    pub file_path: String,
    pub file_path_resolved: PathBuf,
}

impl TypeMismatchError {
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new(
            "TypeMismatchError",
            "The symbol was found but does not have the requested type.",
        );
        diag.row("symbol", &self.symbol);
        diag.row("expected", &self.expected);
        diag.row("found", &self.found);
        diag.row("file_path", &self.file_path);
        diag.row("file_path_resolved", self.file_path_resolved.display());
        diag
    }
}

/// Failure while rewriting relative references.
#[derive(Debug, Clone, Error)]
pub enum RewriteError {
    #[error("malformed relative reference at {}:{line}: {message}", file.display())]
    Syntax {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("cannot rewrite '{}': source is not valid UTF-8", file.display())]
    InvalidUtf8 { file: PathBuf },
}

/// Umbrella error of the public loading API.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Circular(#[from] CircularImportError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    RewrittenImport(#[from] RewrittenImportError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Inconsistent or unsupported option combination.
    #[error("invalid load options: {message}")]
    InvalidOptions { message: String },

    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl LoadError {
    pub fn invalid_options(message: impl Into<String>) -> Self {
        LoadError::InvalidOptions {
            message: message.into(),
        }
    }

    /// Structured diagnostic for this error, when the kind carries one.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            LoadError::Resolve(e) => Some(e.diagnostic()),
            LoadError::Circular(e) => Some(e.diagnostic()),
            LoadError::Execute(e) => Some(e.diagnostic()),
            LoadError::RewrittenImport(e) => Some(e.diagnostic()),
            LoadError::TypeMismatch(e) => Some(e.diagnostic()),
            LoadError::Rewrite(_) | LoadError::InvalidOptions { .. } | LoadError::Vfs(_) => None,
        }
    }
}
