//! Statement-level AST of the relative-reference rewriter
//!
//! The rewriter only cares about relative reference statements; every other
//! line survives as an opaque [`Stmt::Raw`].

use crate::error::CodeInfo;

/// One imported name, with an optional binding alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportItem {
    /// The name the statement binds.
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A relative reference statement, as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeImport {
    /// Number of leading dots; 1 is the current directory.
    pub level: u32,
    /// Dotted module path after the dots, if any.
    pub module: Option<String>,
    /// Imported names; empty when `wildcard` is set.
    pub items: Vec<ImportItem>,
    /// True for `import *`.
    pub wildcard: bool,
    /// 1-based source line.
    pub line: u32,
    /// 0-based column of the statement.
    pub offset: u32,
    /// The statement's original text, indentation excluded.
    pub text: String,
    /// Leading whitespace, preserved into the rewritten line.
    pub indent: String,
}

/// One alternative of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Request path, placeholder included.
    pub path: String,
    /// Symbol to extract; `None` binds the whole unit, `"*"` binds all
    /// public symbols.
    pub symbol: Option<String>,
}

impl Candidate {
    pub fn whole(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            symbol: None,
        }
    }

    pub fn symbol(path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            symbol: Some(symbol.into()),
        }
    }

    /// Serialize as a directive argument: `path` or `path::symbol`.
    pub fn to_spec(&self) -> String {
        match &self.symbol {
            Some(symbol) => format!("{}::{}", self.path, symbol),
            None => self.path.clone(),
        }
    }

    /// Parse a directive argument back into a candidate.
    pub fn from_spec(spec: &str) -> Self {
        match spec.split_once("::") {
            Some((path, symbol)) => Self::symbol(path, symbol),
            None => Self::whole(spec),
        }
    }
}

/// A rewritten reference: try each candidate in order, bind the first hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    /// Name to bind; `"*"` merges all public symbols into the environment.
    pub binding: String,
    pub candidates: Vec<Candidate>,
    /// Location of the original statement, for exhaustion diagnostics.
    pub origin: CodeInfo,
    /// Indentation of the original statement.
    pub indent: String,
}

/// A statement of the rewritten module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// A line the rewriter does not touch.
    Raw(String),
    RelativeImport(RelativeImport),
    FallbackChain(FallbackChain),
}

/// A parsed module: its statements in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleAst {
    pub stmts: Vec<Stmt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_binding_prefers_alias() {
        let plain = ImportItem {
            name: String::from("helper"),
            alias: None,
        };
        let aliased = ImportItem {
            name: String::from("helper"),
            alias: Some(String::from("h")),
        };
        assert_eq!(plain.binding(), "helper");
        assert_eq!(aliased.binding(), "h");
    }

    #[test]
    fn test_candidate_spec_round_trip() {
        let with_symbol = Candidate::symbol("__dir__/utils.py", "helper");
        assert_eq!(with_symbol.to_spec(), "__dir__/utils.py::helper");
        assert_eq!(Candidate::from_spec("__dir__/utils.py::helper"), with_symbol);

        let whole = Candidate::whole("__dir__/utils.py");
        assert_eq!(whole.to_spec(), "__dir__/utils.py");
        assert_eq!(Candidate::from_spec("__dir__/utils.py"), whole);
    }
}
