//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::time::SystemTime;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the loader
/// engine from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Arguments
    /// * `path` - File path
    ///
    /// # Returns
    /// File contents as bytes, or VfsError
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    ///
    /// # Arguments
    /// * `path` - File path
    /// * `content` - Content to write
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if a file exists and can be opened for reading
    fn is_readable(&self, path: &Path) -> bool;

    /// Modification time of a file
    ///
    /// # Returns
    /// The file's modification time, or VfsError if the file does not exist
    fn mtime(&self, path: &Path) -> VfsResult<SystemTime>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;
}
