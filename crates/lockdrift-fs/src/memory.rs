//! In-memory filesystem implementation.

use crate::file_system::normalize_lexically;
use crate::FileSystem;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory filesystem backed by a map of absolute paths to contents.
///
/// Useful when the host already holds the lockfile and manifests in memory,
/// and in tests. Directories exist implicitly as prefixes of stored files.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<HashMap>>`: many concurrent readers, exclusive writer
/// only while files are being added.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory filesystem rooted at `project_root`.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::InvalidInput` if the root is not absolute or
    /// cannot be normalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = project_root.as_ref();
        if !root.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Project root must be absolute: {}", root.display()),
            ));
        }
        let project_root = normalize_lexically(root).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid project root: {}", root.display()),
            )
        })?;

        Ok(Self {
            project_root,
            files: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Add or replace a file. Relative paths are resolved against the root.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::PermissionDenied` if the path is outside the root.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> io::Result<()> {
        let resolved = self.resolve(path.as_ref())?;
        self.files.write().insert(resolved, contents.into());
        Ok(())
    }

    /// Builder-style variant of [`MemoryFileSystem::insert`].
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> io::Result<Self> {
        self.insert(path, contents)?;
        Ok(self)
    }

    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        match normalize_lexically(&absolute) {
            Some(normalized) if normalized.starts_with(&self.project_root) => Ok(normalized),
            _ => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Path outside project root: {}", path.display()),
            )),
        }
    }

    fn is_dir(&self, resolved: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != resolved && file.starts_with(resolved))
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let resolved = self.resolve(path)?;
        let is_file = self.files.read().contains_key(&resolved);
        Ok(is_file || self.is_dir(&resolved))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let resolved = self.resolve(path)?;
        self.files.read().get(&resolved).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", resolved.display()),
            )
        })
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
