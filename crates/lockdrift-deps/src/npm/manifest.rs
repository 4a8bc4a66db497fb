//! package.json reader for workspace projects

use crate::pnpm::normalize_importer_key;
use crate::{DependencyKind, Error, Result, WorkspaceProjectView};
use lockdrift_fs::FileSystem;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,

    #[serde(default)]
    dependencies: Option<BTreeMap<String, String>>,

    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, String>>,

    #[serde(default)]
    optional_dependencies: Option<BTreeMap<String, String>>,

    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, String>>,
}

/// A workspace member and the dependencies it declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceProject {
    name: String,
    importer_key: String,
    declared: BTreeMap<DependencyKind, BTreeMap<String, String>>,
}

impl WorkspaceProject {
    /// Create a project with no declared dependencies.
    pub fn new(name: impl Into<String>, importer_key: &str) -> Self {
        Self {
            name: name.into(),
            importer_key: normalize_importer_key(importer_key),
            declared: BTreeMap::new(),
        }
    }

    /// Declare one dependency (builder style).
    pub fn with_dependency(
        mut self,
        kind: DependencyKind,
        name: impl Into<String>,
        specifier: impl Into<String>,
    ) -> Self {
        self.declared
            .entry(kind)
            .or_default()
            .insert(name.into(), specifier.into());
        self
    }

    /// Build a project from the contents of its `package.json`.
    ///
    /// `path` is only used for error messages.
    ///
    /// # Errors
    /// Returns [`Error::InvalidManifest`] if the contents are not a JSON
    /// object with a `name` and string-valued dependency blocks.
    pub fn from_package_json(importer_key: &str, contents: &str, path: &Path) -> Result<Self> {
        let pkg: PackageJson = serde_json::from_str(contents)
            .map_err(|e| Error::InvalidManifest(path.to_path_buf(), e.to_string()))?;

        let name = pkg
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidManifest(path.to_path_buf(), "missing \"name\"".into()))?;

        let declared = [
            (DependencyKind::Regular, pkg.dependencies),
            (DependencyKind::Dev, pkg.dev_dependencies),
            (DependencyKind::Optional, pkg.optional_dependencies),
            (DependencyKind::Peer, pkg.peer_dependencies),
        ]
        .into_iter()
        .filter_map(|(kind, block)| block.map(|block| (kind, block)))
        .collect();

        Ok(Self {
            name,
            importer_key: normalize_importer_key(importer_key),
            declared,
        })
    }

    /// Read and parse `manifest_path` through a filesystem.
    ///
    /// # Errors
    /// Returns an IO error if the manifest cannot be read, or
    /// [`Error::InvalidManifest`] if it cannot be parsed.
    pub async fn load<F: FileSystem>(
        fs: &Arc<F>,
        manifest_path: &Path,
        importer_key: &str,
    ) -> Result<Self> {
        let contents = fs.read_to_string(manifest_path).await?;
        let project = Self::from_package_json(importer_key, &contents, manifest_path)?;
        tracing::debug!(
            project = %project.name,
            importer = %project.importer_key,
            "loaded workspace project manifest"
        );
        Ok(project)
    }

    /// The package name from the manifest
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kinds `name` is declared under, in manifest block order
    pub fn declared_kinds<'a>(&'a self, name: &'a str) -> impl Iterator<Item = DependencyKind> + 'a {
        self.declared
            .iter()
            .filter(move |(_, deps)| deps.contains_key(name))
            .map(|(kind, _)| *kind)
    }
}

impl WorkspaceProjectView for WorkspaceProject {
    fn importer_key(&self) -> &str {
        &self.importer_key
    }

    fn declared_dependencies(&self, kind: DependencyKind) -> Option<&BTreeMap<String, String>> {
        self.declared.get(&kind)
    }
}
