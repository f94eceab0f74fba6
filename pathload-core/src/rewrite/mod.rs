//! Relative-reference rewriter
//!
//! Rewrites `from .` statements into loader directives before compilation,
//! so code written for a package hierarchy works when loaded by path alone.
//! Parse, transform, and unparse are separate pure stages; [`rewrite_source`]
//! is the composed preprocessor the loader installs when recursive rewriting
//! is requested.

pub mod ast;
pub mod parse;
pub mod transform;

pub use ast::{Candidate, FallbackChain, ImportItem, ModuleAst, RelativeImport, Stmt};
pub use transform::LOAD_DIRECTIVE;

use std::path::Path;

use crate::config::LoaderConfig;
use crate::error::RewriteError;

/// Rewrite all relative references in `source`.
pub fn rewrite_source(
    source: &[u8],
    file: &Path,
    config: &LoaderConfig,
) -> Result<Vec<u8>, RewriteError> {
    let text = std::str::from_utf8(source).map_err(|_| RewriteError::InvalidUtf8 {
        file: file.to_path_buf(),
    })?;
    let ast = parse::parse(text, file)?;
    let rewritten = transform::transform(ast, file, config);
    Ok(transform::unparse(&rewritten).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_source_end_to_end() {
        let config = LoaderConfig::default();
        let out = rewrite_source(
            b"x = 1\nfrom .utils import helper\n",
            Path::new("/app/mod.py"),
            &config,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("x = 1\n"));
        assert!(text.contains("helper = __load_any__("));
    }

    #[test]
    fn test_rewrite_source_propagates_syntax_error() {
        let config = LoaderConfig::default();
        let err = rewrite_source(b"from .utils helper\n", Path::new("/app/mod.py"), &config)
            .unwrap_err();
        assert!(matches!(err, RewriteError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_rewrite_source_rejects_invalid_utf8() {
        let config = LoaderConfig::default();
        let err = rewrite_source(&[0xff, 0xfe, 0x00], Path::new("/app/mod.py"), &config)
            .unwrap_err();
        assert!(matches!(err, RewriteError::InvalidUtf8 { .. }));
        assert!(err.to_string().contains("not valid UTF-8"));
    }
}
