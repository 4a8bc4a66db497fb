//! FileSystem trait for read-only file access.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Read-only filesystem abstraction.
///
/// Every path handed to an implementation is either absolute or relative to
/// [`FileSystem::project_root`]. Implementations refuse paths that escape the
/// root with `io::ErrorKind::PermissionDenied`.
///
/// # Error Handling
///
/// Uses `std::io::Result<T>` so callers can match on `io::ErrorKind::NotFound`
/// regardless of the backing store.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if file doesn't exist.
    /// Returns `io::ErrorKind::InvalidData` if file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Root directory all relative paths are resolved against.
    fn project_root(&self) -> &Path;
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component.
///
/// Returns `None` when `..` would climb above the first component.
pub(crate) fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                normalized.push(component.as_os_str());
                depth = 0;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            Some(PathBuf::from("/a/c"))
        );
        assert_eq!(
            normalize_lexically(Path::new("a/b/..")),
            Some(PathBuf::from("a"))
        );
        assert_eq!(normalize_lexically(Path::new("/..")), None);
        assert_eq!(normalize_lexically(Path::new("../a")), None);
    }
}
