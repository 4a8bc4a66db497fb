//! Conventional commit classification

use crate::error::{Error, Result};
use crate::types::ChangeType;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Commit types of the conventional-commit-types list
pub const DEFAULT_COMMIT_TYPES: &[&str] = &[
    "build", "chore", "ci", "docs", "feat", "fix", "perf", "refactor", "revert", "style", "test",
];

static DEFAULT_MAJOR: LazyLock<Regex> =
    LazyLock::new(|| major_pattern(DEFAULT_COMMIT_TYPES).unwrap());

static MINOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^feat(\(.*?\))?:").unwrap());

static PATCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^fix(\(.*?\))?:").unwrap());

fn major_pattern<S: AsRef<str>>(types: &[S]) -> Result<Regex> {
    if types.is_empty() {
        return Err(Error::NoCommitTypes);
    }
    let alternatives = types
        .iter()
        .map(|t| regex::escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&format!(
        r"(?m)^(?:{alternatives})(\(.*?\))?!:|^BREAKING CHANGE: "
    ))?)
}

/// Source of the commit messages that touched a project
///
/// Implemented by the host on top of its git plumbing.
#[async_trait::async_trait]
pub trait CommitLog: Send + Sync {
    /// Full messages of the commits after `merge_base` that changed files
    /// under `project_folder`.
    async fn commit_messages(&self, merge_base: &str, project_folder: &Path) -> Result<Vec<String>>;
}

/// Classifies conventional commit messages into change types
#[derive(Debug, Clone)]
pub struct ConventionalCommits {
    major: Regex,
}

impl Default for ConventionalCommits {
    fn default() -> Self {
        Self::new()
    }
}

impl ConventionalCommits {
    /// Use the default commit types for breaking-change markers.
    pub fn new() -> Self {
        Self {
            major: DEFAULT_MAJOR.clone(),
        }
    }

    /// Use a custom list of commit types for breaking-change markers
    /// (`type!:`).
    ///
    /// # Errors
    /// Returns [`Error::NoCommitTypes`] for an empty list.
    pub fn with_types<S: AsRef<str>>(types: &[S]) -> Result<Self> {
        Ok(Self {
            major: major_pattern(types)?,
        })
    }

    /// Classify one commit message. Every line is considered, so a
    /// `BREAKING CHANGE: ` footer makes the commit major.
    pub fn classify(&self, message: &str) -> ChangeType {
        if self.major.is_match(message) {
            ChangeType::Major
        } else if MINOR.is_match(message) {
            ChangeType::Minor
        } else if PATCH.is_match(message) {
            ChangeType::Patch
        } else {
            ChangeType::None
        }
    }

    /// The largest change type among `messages`.
    pub fn recommended_change_type<I>(&self, messages: I) -> ChangeType
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut recommended = ChangeType::None;
        for message in messages {
            recommended = recommended.max(self.classify(message.as_ref()));
            if recommended == ChangeType::Major {
                break;
            }
        }
        recommended
    }

    /// Read the commits since `merge_base` for `project_folder` and recommend
    /// a change type for them.
    ///
    /// # Errors
    /// Propagates failures of the commit log.
    pub async fn recommended_change_type_from<L>(
        &self,
        log: &L,
        merge_base: &str,
        project_folder: &Path,
    ) -> Result<ChangeType>
    where
        L: CommitLog + ?Sized,
    {
        let messages = log.commit_messages(merge_base, project_folder).await?;
        let change = self.recommended_change_type(&messages);
        tracing::debug!(
            project = %project_folder.display(),
            commits = messages.len(),
            %change,
            "recommended change type"
        );
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let commits = ConventionalCommits::new();

        assert_eq!(commits.classify("feat!: drop node 14"), ChangeType::Major);
        assert_eq!(commits.classify("refactor(core)!: new api"), ChangeType::Major);
        assert_eq!(
            commits.classify("fix: handle nulls\n\nBREAKING CHANGE: options renamed"),
            ChangeType::Major
        );
        assert_eq!(commits.classify("feat: add flag"), ChangeType::Minor);
        assert_eq!(commits.classify("feat(cli): add flag"), ChangeType::Minor);
        assert_eq!(commits.classify("fix(parser): off by one"), ChangeType::Patch);
        assert_eq!(commits.classify("docs: readme"), ChangeType::None);
        assert_eq!(commits.classify("Merge branch 'main'"), ChangeType::None);
    }

    #[test]
    fn test_bang_requires_known_type() {
        let commits = ConventionalCommits::new();
        assert_eq!(commits.classify("wip!: stuff"), ChangeType::None);

        let custom = ConventionalCommits::with_types(&["wip"]).unwrap();
        assert_eq!(custom.classify("wip!: stuff"), ChangeType::Major);
    }

    #[test]
    fn test_empty_types() {
        let types: [&str; 0] = [];
        assert!(matches!(
            ConventionalCommits::with_types(&types),
            Err(Error::NoCommitTypes)
        ));
    }

    #[test]
    fn test_recommendation_is_the_maximum() {
        let commits = ConventionalCommits::new();
        assert_eq!(
            commits.recommended_change_type(["chore: deps", "fix: crash", "docs: typo"]),
            ChangeType::Patch
        );
        assert_eq!(
            commits.recommended_change_type(Vec::<String>::new()),
            ChangeType::None
        );
    }
}
