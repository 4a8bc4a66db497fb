//! Error types for lockdrift-changes

use thiserror::Error;

/// Result type alias using lockdrift-changes Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while recommending a change type
#[derive(Debug, Error)]
pub enum Error {
    /// A commit type produced an unusable pattern
    #[error("Invalid commit type pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// No commit types were configured
    #[error("At least one commit type is required")]
    NoCommitTypes,

    /// The commit history could not be read
    #[error("Failed to read commit log: {0}")]
    CommitLog(String),
}
