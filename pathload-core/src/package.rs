//! Virtual package synthesis
//!
//! A package here is a dotted name backed by one or more directories, built
//! on demand as units are loaded under a package context. Ensuring a nested
//! name creates every missing ancestor, each backed by the corresponding
//! parent directory, and repeated ensures aggregate additional backing
//! directories instead of replacing them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::resolver::sanitize_name;

/// One synthesized package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Full dotted name.
    pub name: String,
    /// Backing directories, in first-ensured order.
    pub search_roots: Vec<PathBuf>,
    /// Dotted name of the parent package, if nested.
    pub parent: Option<String>,
}

/// Registry of synthesized packages, keyed by dotted name.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    nodes: HashMap<String, PackageNode>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a package (and all its ancestors) exists, backed by `dir`.
    ///
    /// Each ancestor is backed by the matching ancestor of `dir`. Returns the
    /// node for the full dotted name.
    pub fn ensure(&mut self, dotted: &str, dir: &Path) -> &PackageNode {
        let parts: Vec<&str> = dotted.split('.').collect();

        let mut current_dir = dir.to_path_buf();
        // Walk from the leaf package upward, attaching each level to the
        // directory one step closer to the root.
        for depth in (0..parts.len()).rev() {
            let name = parts[..=depth].join(".");
            let parent = if depth == 0 {
                None
            } else {
                Some(parts[..depth].join("."))
            };

            let node = self.nodes.entry(name.clone()).or_insert(PackageNode {
                name,
                search_roots: Vec::new(),
                parent,
            });
            if !node.search_roots.contains(&current_dir) {
                node.search_roots.push(current_dir.clone());
            }

            current_dir = current_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("/"));
        }

        &self.nodes[dotted]
    }

    pub fn get(&self, dotted: &str) -> Option<&PackageNode> {
        self.nodes.get(dotted)
    }

    /// Direct children of the given package.
    pub fn children(&self, dotted: &str) -> Vec<&PackageNode> {
        let mut children: Vec<&PackageNode> = self
            .nodes
            .values()
            .filter(|n| n.parent.as_deref() == Some(dotted))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// How a load request names its package context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSpec {
    /// An explicit dotted package name.
    Named(String),
    /// Derive the name from the last `n` directory components of the unit's
    /// path.
    Parts(usize),
}

impl PackageSpec {
    /// Compute the dotted package name for a unit at `unit_path`.
    pub fn package_name(&self, unit_path: &Path) -> Result<String, LoadError> {
        match self {
            PackageSpec::Named(name) => {
                if name.is_empty() {
                    return Err(LoadError::invalid_options("package name must not be empty"));
                }
                Ok(name.clone())
            }
            PackageSpec::Parts(0) => Err(LoadError::invalid_options(
                "package depth must be at least 1",
            )),
            PackageSpec::Parts(n) => {
                let dir = unit_path.parent().unwrap_or(Path::new("/"));
                let components: Vec<String> = dir
                    .components()
                    .filter_map(|c| match c {
                        std::path::Component::Normal(part) => {
                            part.to_str().map(sanitize_name)
                        }
                        _ => None,
                    })
                    .collect();
                if components.len() < *n {
                    return Err(LoadError::invalid_options(format!(
                        "package depth {} exceeds the {} directory components of the unit's path",
                        n,
                        components.len()
                    )));
                }
                Ok(components[components.len() - n..].join("."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_ancestors() {
        let mut registry = PackageRegistry::new();
        registry.ensure("app.services.auth", Path::new("/src/app/services/auth"));

        assert_eq!(registry.len(), 3);
        let leaf = registry.get("app.services.auth").unwrap();
        assert_eq!(leaf.parent.as_deref(), Some("app.services"));
        assert_eq!(
            leaf.search_roots,
            vec![PathBuf::from("/src/app/services/auth")]
        );

        let mid = registry.get("app.services").unwrap();
        assert_eq!(mid.search_roots, vec![PathBuf::from("/src/app/services")]);
        assert_eq!(mid.parent.as_deref(), Some("app"));

        let root = registry.get("app").unwrap();
        assert_eq!(root.parent, None);
        assert_eq!(root.search_roots, vec![PathBuf::from("/src/app")]);
    }

    #[test]
    fn test_ensure_aggregates_roots() {
        let mut registry = PackageRegistry::new();
        registry.ensure("pkg", Path::new("/first"));
        registry.ensure("pkg", Path::new("/second"));
        registry.ensure("pkg", Path::new("/first"));

        let node = registry.get("pkg").unwrap();
        assert_eq!(
            node.search_roots,
            vec![PathBuf::from("/first"), PathBuf::from("/second")]
        );
    }

    #[test]
    fn test_children() {
        let mut registry = PackageRegistry::new();
        registry.ensure("app.b", Path::new("/src/app/b"));
        registry.ensure("app.a", Path::new("/src/app/a"));

        let names: Vec<&str> = registry
            .children("app")
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["app.a", "app.b"]);
    }

    #[test]
    fn test_named_spec() {
        let spec = PackageSpec::Named(String::from("my.pkg"));
        let name = spec.package_name(Path::new("/any/mod.py")).unwrap();
        assert_eq!(name, "my.pkg");
    }

    #[test]
    fn test_parts_spec_takes_trailing_dirs() {
        let spec = PackageSpec::Parts(2);
        let name = spec
            .package_name(Path::new("/src/app/services/mod.py"))
            .unwrap();
        assert_eq!(name, "app.services");
    }

    #[test]
    fn test_parts_spec_sanitizes() {
        let spec = PackageSpec::Parts(1);
        let name = spec
            .package_name(Path::new("/src/my-app/mod.py"))
            .unwrap();
        assert_eq!(name, "my_app");
    }

    #[test]
    fn test_parts_zero_rejected() {
        let spec = PackageSpec::Parts(0);
        let err = spec.package_name(Path::new("/src/mod.py")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidOptions { .. }));
    }

    #[test]
    fn test_parts_too_deep_rejected() {
        let spec = PackageSpec::Parts(5);
        let err = spec.package_name(Path::new("/src/mod.py")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidOptions { .. }));
    }
}
