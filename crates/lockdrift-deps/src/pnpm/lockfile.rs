//! Lockfile loading and the normalized snapshot

use super::{v5, v6, Importer, LockedDependency, LockfileVersion, ResolvedPackage};
use crate::overrides::Overrides;
use crate::specifier::split_resolution_key;
use crate::{Error, Result};
use lockdrift_fs::FileSystem;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A `pnpm-lock.yaml` document of either supported major version, as one
/// read-only, version-independent model.
///
/// Snapshots are immutable once loaded and can be shared between threads
/// (`Arc<LockfileSnapshot>`).
#[derive(Debug, Clone)]
pub struct LockfileSnapshot {
    path: PathBuf,
    version: LockfileVersion,
    importers: BTreeMap<String, Importer>,
    overrides: Overrides,
    auto_install_peers: bool,
    packages: BTreeMap<String, ResolvedPackage>,
}

/// A lockfile document, tagged by dialect
enum LockfileDocument {
    V5(v5::Document),
    V6(v6::Document),
}

/// What every dialect traversal produces
pub(super) struct DocumentParts {
    pub importers: BTreeMap<String, Importer>,
    pub overrides: BTreeMap<String, String>,
    pub auto_install_peers: bool,
    pub packages: BTreeMap<String, PackageDoc>,
}

/// A packages-table entry; identical in both dialects
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PackageDoc {
    #[serde(default)]
    resolution: Option<ResolutionDoc>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dev: Option<bool>,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolutionDoc {
    #[serde(default)]
    integrity: Option<String>,
    #[serde(default)]
    tarball: Option<String>,
}

impl LockfileSnapshot {
    /// Load a lockfile from disk.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a lockfile of a
    /// supported version.
    pub fn load_from_file(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml_str(path, &contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "lockfile not found");
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Load a lockfile through a filesystem.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a lockfile of a
    /// supported version.
    pub async fn load_with_filesystem<F: FileSystem>(
        fs: &Arc<F>,
        path: &Path,
    ) -> Result<Option<Self>> {
        match fs.read_to_string(path).await {
            Ok(contents) => Self::from_yaml_str(path, &contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "lockfile not found");
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Parse a lockfile document. `path` is recorded for error messages and
    /// [`LockfileSnapshot::path`].
    ///
    /// # Errors
    /// [`Error::InvalidLockfile`] for malformed documents,
    /// [`Error::UnsupportedLockfileVersion`] for majors other than 5 and 6,
    /// [`Error::InvalidOverride`] for unreadable override selectors.
    pub fn from_yaml_str(path: &Path, contents: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(contents).map_err(|e| Error::invalid_lockfile(path, e))?;
        let version = LockfileVersion::detect(path, &value)?;

        tracing::debug!(path = %path.display(), %version, "parsing pnpm lockfile");

        let document = match version {
            LockfileVersion::V5 => serde_yaml::from_value(value).map(LockfileDocument::V5),
            LockfileVersion::V6 => serde_yaml::from_value(value).map(LockfileDocument::V6),
        }
        .map_err(|e| Error::invalid_lockfile(path, e))?;

        let parts = match document {
            LockfileDocument::V5(document) => document.into_parts(),
            LockfileDocument::V6(document) => document.into_parts(),
        };

        let overrides = Overrides::from_map(parts.overrides)?;
        let packages = parts
            .packages
            .into_iter()
            .filter_map(|(key, doc)| {
                let package = resolve_package(&key, doc)?;
                Some((key, package))
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            version,
            importers: parts.importers,
            overrides,
            auto_install_peers: parts.auto_install_peers,
            packages,
        })
    }

    /// Where the lockfile was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The dialect the lockfile was written in
    pub fn version(&self) -> LockfileVersion {
        self.version
    }

    /// `5` or `6`
    pub fn major_version(&self) -> u32 {
        self.version.major()
    }

    /// The importer for a project key (`.` for the root); the key is
    /// normalized before lookup.
    pub fn importer(&self, key: &str) -> Option<&Importer> {
        self.importers.get(&super::normalize_importer_key(key))
    }

    /// All importers by key
    pub fn importers(&self) -> impl Iterator<Item = (&str, &Importer)> {
        self.importers.iter().map(|(key, importer)| (key.as_str(), importer))
    }

    /// Overrides recorded at lock time
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Whether the lockfile was written with `autoInstallPeers`, in which
    /// case importers also record the peers a project declares.
    pub fn auto_install_peers(&self) -> bool {
        self.auto_install_peers
    }

    /// All packages by resolution key
    pub fn packages(&self) -> impl Iterator<Item = (&str, &ResolvedPackage)> {
        self.packages.iter().map(|(key, package)| (key.as_str(), package))
    }

    /// The package stored under a resolution key
    pub fn package(&self, key: &str) -> Option<&ResolvedPackage> {
        self.packages.get(key)
    }

    /// The package a recorded dependency resolved to. `None` for workspace
    /// links and for keys missing from the packages table.
    pub fn resolve(&self, dependency: &LockedDependency) -> Option<&ResolvedPackage> {
        self.package(dependency.resolution_key.as_deref()?)
    }
}

fn resolve_package(key: &str, doc: PackageDoc) -> Option<ResolvedPackage> {
    let (name, version, peer_suffix) = match split_resolution_key(key) {
        Some(parts) => (
            parts.name.to_string(),
            parts.version.to_string(),
            parts.peer_suffix.map(str::to_string),
        ),
        None => match (doc.name, doc.version) {
            (Some(name), Some(version)) => (name, version, None),
            (Some(name), None) => (name, key.to_string(), None),
            _ => {
                tracing::warn!(key, "skipping package entry with an unrecognized key");
                return None;
            }
        },
    };

    let resolution = doc.resolution.unwrap_or_default();

    Some(ResolvedPackage {
        name,
        version,
        peer_suffix,
        integrity: resolution.integrity,
        tarball: resolution.tarball,
        dev: doc.dev,
        optional: doc.optional,
        dependencies: doc.dependencies,
        optional_dependencies: doc.optional_dependencies,
        peer_dependencies: doc.peer_dependencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_package_uses_its_own_name() {
        let yaml = r#"
lockfileVersion: 5.4
importers:
  .:
    specifiers:
      def: github:abc/def#188ed64
    dependencies:
      def: github.com/abc/def/188ed64efd5218beda276e02f2277bf3a6b745b2
packages:
  github.com/abc/def/188ed64efd5218beda276e02f2277bf3a6b745b2:
    resolution: {tarball: https://codeload.github.com/abc/def/tar.gz/188ed64efd5218beda276e02f2277bf3a6b745b2}
    name: def
    version: 0.1.0
    dev: false
"#;
        let snapshot = LockfileSnapshot::from_yaml_str(Path::new("pnpm-lock.yaml"), yaml).unwrap();
        let importer = snapshot.importer(".").unwrap();
        let dep = importer.get(crate::DependencyKind::Regular, "def").unwrap();

        let package = snapshot.resolve(dep).unwrap();
        assert_eq!(package.name, "def");
        assert_eq!(package.version, "0.1.0");
        assert_eq!(package.dev, Some(false));
        assert!(package.tarball.is_some());
    }

    #[test]
    fn test_unrecognized_package_keys_are_skipped() {
        let yaml = r#"
lockfileVersion: '6.0'
packages:
  not-a-key:
    resolution: {integrity: sha512-abc}
"#;
        let snapshot = LockfileSnapshot::from_yaml_str(Path::new("pnpm-lock.yaml"), yaml).unwrap();
        assert_eq!(snapshot.packages().count(), 0);
    }

    #[test]
    fn test_schema_mismatch_is_invalid() {
        let yaml = "lockfileVersion: '6.0'\nimporters: [1, 2]\n";
        let err = LockfileSnapshot::from_yaml_str(Path::new("pnpm-lock.yaml"), yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidLockfile { .. }));
    }
}
