//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct FileEntry {
    content: Vec<u8>,
    mtime: SystemTime,
}

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired.
///
/// Modification times use a logical clock: every write advances the clock by
/// one second from the Unix epoch, so tests can compare mtimes without
/// sleeping. `touch` and `set_mtime` manipulate the clock explicitly.
///
/// # Example
/// ```
/// use pathload_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.txt")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, FileEntry>>>,
    dirs: Arc<RwLock<BTreeSet<String>>>,
    clock: Arc<AtomicU64>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            dirs: Arc::new(RwLock::new(BTreeSet::new())),
            clock: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.write_file(Path::new(path.as_ref()), &content.into())
                .expect("memory fs write cannot fail");
        }
        fs
    }

    /// Advance the file's mtime to the next clock tick.
    ///
    /// Returns an error if the file does not exist.
    pub fn touch(&self, path: &Path) -> VfsResult<()> {
        let stamp = self.tick();
        self.set_mtime(path, stamp)
    }

    /// Set the file's mtime to an explicit value.
    pub fn set_mtime(&self, path: &Path, mtime: SystemTime) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        match files.get_mut(&normalized) {
            Some(entry) => {
                entry.mtime = mtime;
                Ok(())
            }
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    fn tick(&self) -> SystemTime {
        let t = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        UNIX_EPOCH + Duration::from_secs(t)
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn normalize_path(&self, path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;

        files
            .get(&normalized)
            .map(|entry| entry.content.clone())
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mtime = self.tick();
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        files.insert(
            normalized,
            FileEntry {
                content: content.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        if let Ok(dirs) = self.dirs.read() {
            if dirs.contains(&normalized) {
                return true;
            }
        }
        // A directory also exists implicitly when any file lives under it.
        let prefix = format!("{}/", normalized.trim_end_matches('/'));
        match self.files.read() {
            Ok(files) => files.keys().any(|k| k.starts_with(&prefix)),
            Err(_) => false,
        }
    }

    fn is_readable(&self, path: &Path) -> bool {
        self.is_file(path)
    }

    fn mtime(&self, path: &Path) -> VfsResult<SystemTime> {
        let normalized = self.normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        files
            .get(&normalized)
            .map(|entry| entry.mtime)
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        match files.remove(&normalized) {
            Some(_) => Ok(()),
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = self.normalize_path(path);
        let mut dirs = self.dirs.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;
        let mut current = String::new();
        for part in normalized.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            dirs.insert(current.clone());
        }
        Ok(())
    }
}
