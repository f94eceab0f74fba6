//! Request path resolution
//!
//! Turns a requested path string into a canonical absolute path plus a unit
//! name derived from the file stem. Resolution is purely lexical; existence
//! and readability are checked later against the virtual file system.

use std::path::{Component, Path, PathBuf};

use crate::config::LoaderConfig;
use crate::error::ResolveError;

/// The result of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The path exactly as requested.
    pub original: String,
    /// Canonical absolute path after placeholder expansion and
    /// normalization.
    pub resolved: PathBuf,
    /// Identifier-safe name derived from the file stem.
    pub unit_name: String,
}

/// Resolve a request path against the loader configuration.
///
/// The directory placeholder is only valid as the leading component and
/// expands to the directory of `caller`; a placeholder without a known
/// caller is a resolve failure.
pub fn resolve(
    config: &LoaderConfig,
    file_path: &str,
    caller: Option<&Path>,
) -> Result<ResolvedPath, ResolveError> {
    let request = Path::new(file_path);

    let expanded = if leading_placeholder(request, &config.dir_placeholder) {
        let caller = caller.ok_or_else(|| ResolveError {
            file_path: file_path.to_string(),
            file_path_resolved: request.to_path_buf(),
            reason: String::from(
                "The request uses the directory placeholder but the caller's location is unknown.",
            ),
            suggested_path: None,
            caller_reference: None,
        })?;
        let caller_dir = caller.parent().unwrap_or(Path::new("/"));
        let rest: PathBuf = request.components().skip(1).collect();
        caller_dir.join(rest)
    } else {
        request.to_path_buf()
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        config.base_dir.join(expanded)
    };

    let resolved = normalize(&absolute);
    let unit_name = sanitize_name(
        resolved
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unit"),
    );

    Ok(ResolvedPath {
        original: file_path.to_string(),
        resolved,
        unit_name,
    })
}

fn leading_placeholder(path: &Path, placeholder: &str) -> bool {
    matches!(
        path.components().next(),
        Some(Component::Normal(first)) if first.to_str() == Some(placeholder)
    )
}

/// Lexically normalize a path: drop `.`, fold `..` against preceding
/// components without consulting the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // A `..` above the root is swallowed, as the OS would.
                if !out.pop() && !out.has_root() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Derive an identifier-safe name from a file stem.
pub fn sanitize_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if name.is_empty() {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoaderConfig {
        LoaderConfig::with_base_dir("/project")
    }

    #[test]
    fn test_absolute_path_untouched() {
        let r = resolve(&config(), "/app/mod.py", None).unwrap();
        assert_eq!(r.resolved, PathBuf::from("/app/mod.py"));
        assert_eq!(r.unit_name, "mod");
    }

    #[test]
    fn test_relative_path_anchored_at_base_dir() {
        let r = resolve(&config(), "lib/mod.py", None).unwrap();
        assert_eq!(r.resolved, PathBuf::from("/project/lib/mod.py"));
    }

    #[test]
    fn test_placeholder_expands_to_caller_dir() {
        let caller = PathBuf::from("/app/sub/main.py");
        let r = resolve(&config(), "__dir__/sibling.py", Some(&caller)).unwrap();
        assert_eq!(r.resolved, PathBuf::from("/app/sub/sibling.py"));
    }

    #[test]
    fn test_placeholder_with_parent_steps() {
        let caller = PathBuf::from("/app/sub/main.py");
        let r = resolve(&config(), "__dir__/../other/mod.py", Some(&caller)).unwrap();
        assert_eq!(r.resolved, PathBuf::from("/app/other/mod.py"));
    }

    #[test]
    fn test_placeholder_without_caller_fails() {
        let err = resolve(&config(), "__dir__/sibling.py", None).unwrap_err();
        assert!(err.reason.contains("caller's location is unknown"));
    }

    #[test]
    fn test_placeholder_only_leading() {
        // A placeholder in the middle of the path is treated literally.
        let r = resolve(&config(), "/app/__dir__/mod.py", None).unwrap();
        assert_eq!(r.resolved, PathBuf::from("/app/__dir__/mod.py"));
    }

    #[test]
    fn test_normalize_folds_components() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d.py")),
            PathBuf::from("/a/c/d.py")
        );
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my-module"), "my_module");
        assert_eq!(sanitize_name("3d_math"), "_3d_math");
        assert_eq!(sanitize_name("plain"), "plain");
        assert_eq!(sanitize_name(""), "_");
    }
}
