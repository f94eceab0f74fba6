//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::Path;
use std::time::SystemTime;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
///
/// # Example
/// ```
/// use pathload_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(!fs.exists(Path::new("/nonexistent/pathload")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound {
                path: path.to_string_lossy().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied {
                path: path.to_string_lossy().to_string(),
            },
            _ => e.into(),
        })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(path, content).map_err(|e| e.into())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_readable(&self, path: &Path) -> bool {
        std::fs::File::open(path).is_ok()
    }

    fn mtime(&self, path: &Path) -> VfsResult<SystemTime> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => VfsError::from(e),
        })?;
        meta.modified().map_err(|e| e.into())
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        std::fs::remove_file(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => VfsError::from(e),
        })
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        std::fs::create_dir_all(path).map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pathload_vfs_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_native_exists() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("exists");

        let _ = std::fs::remove_file(&temp_file);

        assert!(!fs.exists(&temp_file));

        {
            let mut file = std::fs::File::create(&temp_file).unwrap();
            file.write_all(b"test").unwrap();
        }

        assert!(fs.exists(&temp_file));
        assert!(fs.is_readable(&temp_file));

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_read_write() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("rw");

        let _ = std::fs::remove_file(&temp_file);

        fs.write_file(&temp_file, b"hello native").unwrap();

        let content = fs.read_file(&temp_file).unwrap();
        assert_eq!(content, b"hello native");

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_mtime_advances() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("mtime");

        let _ = std::fs::remove_file(&temp_file);

        fs.write_file(&temp_file, b"v1").unwrap();
        let first = fs.mtime(&temp_file).unwrap();
        assert!(first <= SystemTime::now());

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_mtime_nonexistent() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("mtime_missing");

        let _ = std::fs::remove_file(&temp_file);

        let result = fs.mtime(&temp_file);
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_native_remove_file() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("remove");

        fs.write_file(&temp_file, b"bye").unwrap();
        assert!(fs.exists(&temp_file));

        fs.remove_file(&temp_file).unwrap();
        assert!(!fs.exists(&temp_file));

        let result = fs.remove_file(&temp_file);
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_native_create_dir_all() {
        let fs = NativeFileSystem::new();
        let dir = temp_file("nested_dir").join("a").join("b");

        fs.create_dir_all(&dir).unwrap();
        assert!(fs.is_dir(&dir));

        std::fs::remove_dir_all(temp_file("nested_dir")).unwrap();
    }

    #[test]
    fn test_native_read_nonexistent() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("nonexistent");

        let _ = std::fs::remove_file(&temp_file);

        let result = fs.read_file(&temp_file);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
        assert!(!fs.is_readable(&temp_file));
    }
}
