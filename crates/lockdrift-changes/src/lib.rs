//! # lockdrift-changes
//!
//! Recommends how a project's version should change, from the conventional
//! commit messages that touched it since a merge base.
//!
//! - `type!: ...` or a `BREAKING CHANGE: ` line -> major
//! - `feat: ...` -> minor
//! - `fix: ...` -> patch
//! - anything else -> none
//!
//! Reading the commit history is left to a [`CommitLog`] implementation.
//!
//! ```
//! use lockdrift_changes::{ChangeType, ConventionalCommits};
//!
//! let commits = ConventionalCommits::new();
//! let change = commits.recommended_change_type(["fix: typo", "feat(cli): add --json"]);
//! assert_eq!(change, ChangeType::Minor);
//! ```

pub mod conventional;
pub mod error;
pub mod types;

pub use conventional::{CommitLog, ConventionalCommits, DEFAULT_COMMIT_TYPES};
pub use error::{Error, Result};
pub use types::ChangeType;
