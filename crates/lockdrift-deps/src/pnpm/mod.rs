//! pnpm lockfile support
//!
//! `pnpm-lock.yaml` changed shape between lockfile major versions 5 and 6.
//! Each dialect has its own document schema and traversal ([`v5`], [`v6`]);
//! both normalize into the same [`LockfileSnapshot`], so nothing downstream
//! needs to know which version was read.

mod lockfile;
mod v5;
mod v6;

pub use lockfile::LockfileSnapshot;

use crate::error::{Error, Result};
use crate::types::DependencyKind;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Lockfile major versions this crate can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockfileVersion {
    /// `lockfileVersion: 5.x` (numeric), `specifiers` blocks, `/name/version` keys
    V5,
    /// `lockfileVersion: '6.x'` (string), inline specifiers, `/name@version` keys
    V6,
}

impl LockfileVersion {
    /// The major version number
    pub const fn major(self) -> u32 {
        match self {
            LockfileVersion::V5 => 5,
            LockfileVersion::V6 => 6,
        }
    }

    /// Read the `lockfileVersion` field of a raw document.
    pub(crate) fn detect(path: &Path, document: &serde_yaml::Value) -> Result<Self> {
        let value = document
            .get("lockfileVersion")
            .ok_or_else(|| Error::invalid_lockfile(path, "missing lockfileVersion"))?;

        let (raw, major) = match value {
            serde_yaml::Value::Number(number) => {
                let major = number
                    .as_u64()
                    .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.trunc() as u64));
                (number.to_string(), major)
            }
            serde_yaml::Value::String(text) => {
                let major = text.trim().split('.').next().and_then(|m| m.parse::<u64>().ok());
                (text.clone(), major)
            }
            _ => return Err(Error::invalid_lockfile(path, "lockfileVersion is not a version")),
        };

        match major {
            Some(5) => Ok(LockfileVersion::V5),
            Some(6) => Ok(LockfileVersion::V6),
            Some(_) => Err(Error::UnsupportedLockfileVersion {
                path: path.to_path_buf(),
                version: raw,
            }),
            None => Err(Error::invalid_lockfile(
                path,
                format!("lockfileVersion '{raw}' is not numeric"),
            )),
        }
    }
}

impl fmt::Display for LockfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major())
    }
}

/// One dependency as an importer recorded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedDependency {
    /// The declared specifier at lock time, when the lockfile recorded one
    pub specifier: Option<String>,
    /// The recorded resolution: a bare version (possibly peer-suffixed), a
    /// resolution key for aliases, `link:` for workspace links, or a source
    /// reference for git dependencies
    pub version: String,
    /// The packages-table key the dependency resolved to (`None` for links)
    pub resolution_key: Option<String>,
}

/// The dependencies a lockfile recorded for one workspace project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Importer {
    dependencies: BTreeMap<DependencyKind, BTreeMap<String, LockedDependency>>,
}

impl Importer {
    pub(crate) fn insert(&mut self, kind: DependencyKind, name: String, dependency: LockedDependency) {
        self.dependencies
            .entry(kind)
            .or_default()
            .insert(name, dependency);
    }

    /// Recorded dependencies of one kind, in name order.
    pub fn dependencies(
        &self,
        kind: DependencyKind,
    ) -> impl Iterator<Item = (&str, &LockedDependency)> + '_ {
        self.dependencies
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|(name, dep)| (name.as_str(), dep))
    }

    /// The entry recorded for `name` under `kind`
    pub fn get(&self, kind: DependencyKind, name: &str) -> Option<&LockedDependency> {
        self.dependencies.get(&kind)?.get(name)
    }

    /// Every entry recorded for `name`, across kinds.
    pub fn entries<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (DependencyKind, &'a LockedDependency)> + 'a {
        self.dependencies
            .iter()
            .filter_map(move |(kind, deps)| deps.get(name).map(|dep| (*kind, dep)))
    }

    /// Names recorded under any kind
    pub fn names(&self) -> BTreeSet<&str> {
        self.dependencies
            .values()
            .flat_map(|deps| deps.keys().map(String::as_str))
            .collect()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.dependencies.values().all(BTreeMap::is_empty)
    }
}

/// An entry of the lockfile's packages table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package name
    pub name: String,
    /// Resolved version (the source reference for git packages)
    pub version: String,
    /// Raw peer annotation of the key, if any
    pub peer_suffix: Option<String>,
    /// `resolution.integrity`
    pub integrity: Option<String>,
    /// `resolution.tarball`
    pub tarball: Option<String>,
    /// `dev` flag; `None` when the package is needed by both graphs
    pub dev: Option<bool>,
    /// `optional` flag
    pub optional: bool,
    /// Transitive `dependencies`
    pub dependencies: BTreeMap<String, String>,
    /// Transitive `optionalDependencies`
    pub optional_dependencies: BTreeMap<String, String>,
    /// Declared `peerDependencies`
    pub peer_dependencies: BTreeMap<String, String>,
}

/// Normalize an importer key: `/` separators, no leading `./`, no trailing
/// `/`, `.` for the root.
pub(crate) fn normalize_importer_key(key: &str) -> String {
    let mut key = key.trim().replace('\\', "/");
    while let Some(rest) = key.strip_prefix("./") {
        key = rest.to_string();
    }
    let key = key.trim_end_matches('/');
    if key.is_empty() {
        ".".to_string()
    } else {
        key.to_string()
    }
}

/// The packages-table key a recorded version points to.
///
/// `separator` joins name and version: `/` in v5 keys, `@` in v6 keys.
pub(crate) fn resolution_key(name: &str, version: &str, separator: char) -> Option<String> {
    if version.is_empty() || version.starts_with("link:") {
        return None;
    }

    // Host-qualified, scheme-prefixed or already a key, unless the first
    // separator starts a peer annotation.
    let qualified = version.starts_with('/')
        || version
            .find([':', '/', '(', '_'])
            .is_some_and(|idx| matches!(version.as_bytes()[idx], b':' | b'/'));

    if qualified {
        Some(version.to_string())
    } else {
        Some(format!("/{name}{separator}{version}"))
    }
}
