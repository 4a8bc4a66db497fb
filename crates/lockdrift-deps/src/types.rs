//! Core types shared by manifests, lockfiles and the detector

use std::fmt;

/// Kind of a declared dependency
///
/// Ordering follows the order dependency blocks appear in a `package.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyKind {
    /// `dependencies`
    Regular,
    /// `devDependencies`
    Dev,
    /// `optionalDependencies`
    Optional,
    /// `peerDependencies` (never installed for the declaring project itself)
    Peer,
}

impl DependencyKind {
    /// The kinds a package manager installs for a workspace project and
    /// records in the project's lockfile importer.
    pub const INSTALLED: [DependencyKind; 3] = [
        DependencyKind::Regular,
        DependencyKind::Dev,
        DependencyKind::Optional,
    ];

    /// The manifest/lockfile field name for this kind.
    pub const fn field_name(self) -> &'static str {
        match self {
            DependencyKind::Regular => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Optional => "optionalDependencies",
            DependencyKind::Peer => "peerDependencies",
        }
    }

    /// Precedence when one name is declared under several kinds.
    ///
    /// The package manager keeps optional over regular over dev, and records
    /// the name under the winning kind only.
    pub(crate) const fn precedence(self) -> u8 {
        match self {
            DependencyKind::Optional => 3,
            DependencyKind::Regular => 2,
            DependencyKind::Dev => 1,
            DependencyKind::Peer => 0,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert!(DependencyKind::Optional.precedence() > DependencyKind::Regular.precedence());
        assert!(DependencyKind::Regular.precedence() > DependencyKind::Dev.precedence());
    }

    #[test]
    fn test_display_uses_field_name() {
        assert_eq!(DependencyKind::Dev.to_string(), "devDependencies");
    }
}
