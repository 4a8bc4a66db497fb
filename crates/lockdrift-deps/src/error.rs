//! Error types for lockdrift-deps

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using lockdrift-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lockdrift-deps
///
/// An unparseable dependency specifier is not an error: the parser returns
/// `None` and the detector treats it as a mismatch.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The lockfile exists but does not match the expected document schema
    #[error("Invalid lockfile {path}: {message}")]
    InvalidLockfile {
        /// Path to the lockfile
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// The lockfile declares a major version this crate cannot read
    #[error("Unsupported lockfile version '{version}' in {path} (supported major versions: 5, 6)")]
    UnsupportedLockfileVersion {
        /// Path to the lockfile
        path: PathBuf,
        /// The raw `lockfileVersion` value
        version: String,
    },

    /// An override selector could not be parsed
    #[error("Invalid override selector '{0}': {1}")]
    InvalidOverride(String, String),

    /// A package.json could not be read as a workspace project
    #[error("Invalid manifest {0}: {1}")]
    InvalidManifest(PathBuf, String),
}

impl Error {
    pub(crate) fn invalid_lockfile(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::InvalidLockfile {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_display() {
        let error = Error::UnsupportedLockfileVersion {
            path: PathBuf::from("/repo/pnpm-lock.yaml"),
            version: "9.0".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("'9.0'"));
        assert!(message.contains("pnpm-lock.yaml"));
    }

    #[test]
    fn test_invalid_lockfile_display() {
        let error = Error::invalid_lockfile("/repo/pnpm-lock.yaml", "missing lockfileVersion");
        assert_eq!(
            error.to_string(),
            "Invalid lockfile /repo/pnpm-lock.yaml: missing lockfileVersion"
        );
    }
}
