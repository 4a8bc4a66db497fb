//! Native filesystem implementation using std::fs + tokio.

use crate::file_system::normalize_lexically;
use crate::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// Blocking std::fs calls are moved onto the tokio blocking pool so loading a
/// large lockfile never stalls the async runtime.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a new native filesystem scoped to a project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or can't be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = project_root.as_ref().canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!(
                    "Project root does not exist: {}",
                    project_root.as_ref().display()
                ),
            )
        })?;

        Ok(Self { project_root })
    }

    /// Validate that a path is within the project root.
    ///
    /// Existing paths are canonicalized so symlinks cannot point outside the
    /// root. Paths that don't exist yet are normalized lexically.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let resolved = match absolute.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => {
                let parent = absolute.parent().and_then(|p| p.canonicalize().ok());
                match (parent, absolute.file_name()) {
                    (Some(parent), Some(name)) => parent.join(name),
                    _ => normalize_lexically(&absolute).ok_or_else(|| traversal(path, self))?,
                }
            }
        };

        if !resolved.starts_with(&self.project_root) {
            return Err(traversal(&resolved, self));
        }

        Ok(resolved)
    }
}

fn traversal(path: &Path, fs: &NativeFileSystem) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!(
            "Path traversal detected: {} is outside project root {}",
            path.display(),
            fs.project_root.display()
        ),
    )
}

fn join_error(e: task::JoinError) -> io::Error {
    io::Error::other(e)
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || Ok(validated.exists()))
            .await
            .map_err(join_error)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(join_error)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
