//! Loader configuration types - pure data structures
//!
//! Everything that affects a single load is a named option on
//! [`LoadOptions`](crate::options::LoadOptions); `LoaderConfig` only carries
//! the per-loader constants: what the hosted language's files look like and
//! where relative requests are anchored.

use std::path::PathBuf;

/// Per-loader constants describing the hosted source language.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Conventional file extension of hosted source files (without the dot).
    pub source_extension: String,
    /// Base name of a directory's initializer file.
    pub init_basename: String,
    /// Placeholder token meaning "directory of the requesting code".
    pub dir_placeholder: String,
    /// Infix inserted before the extension of preprocessing artifacts.
    pub artifact_infix: String,
    /// Directory against which relative request paths are absolutized.
    pub base_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_extension: String::from("py"),
            init_basename: String::from("__init__"),
            dir_placeholder: String::from("__dir__"),
            artifact_infix: String::from("__preprocessed__"),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        }
    }
}

impl LoaderConfig {
    /// Configuration anchored at an explicit base directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let config = LoaderConfig::default();
        assert_eq!(config.source_extension, "py");
        assert_eq!(config.init_basename, "__init__");
        assert_eq!(config.dir_placeholder, "__dir__");
        assert_eq!(config.artifact_infix, "__preprocessed__");
    }

    #[test]
    fn test_with_base_dir() {
        let config = LoaderConfig::with_base_dir("/project");
        assert_eq!(config.base_dir, PathBuf::from("/project"));
        assert_eq!(config.source_extension, "py");
    }
}
