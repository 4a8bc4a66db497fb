//! Change types

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a project's version should change
///
/// Ordered by impact, so the recommendation for many commits is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// No release needed
    #[default]
    None,
    /// Bug fixes only
    Patch,
    /// New features
    Minor,
    /// Breaking changes
    Major,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeType::None => "none",
            ChangeType::Patch => "patch",
            ChangeType::Minor => "minor",
            ChangeType::Major => "major",
        };
        f.write_str(name)
    }
}
