use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure, read from `lockdrift.toml` at the
/// workspace root
///
/// ```toml
/// version = "1.0"
/// lockfile = "common/config/rush/pnpm-lock.yaml"
/// importer_root = "common/temp"
///
/// [overrides]
/// typescript = "4.7.4"
///
/// [[projects]]
/// name = "foo"
/// path = "projects/foo"
/// ```
///
/// All paths are relative to the workspace root.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LockdriftConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Location of the pnpm lockfile
    #[serde(default = "default_lockfile")]
    pub lockfile: PathBuf,

    /// Folder the lockfile's importer keys are relative to. Defaults to the
    /// lockfile's folder.
    #[serde(default)]
    pub importer_root: Option<PathBuf>,

    /// Workspace-level dependency overrides (`selector -> specifier`)
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,

    /// Detection settings
    #[serde(default)]
    pub settings: DetectionSettings,

    /// Workspace projects
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Default for LockdriftConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            lockfile: default_lockfile(),
            importer_root: None,
            overrides: BTreeMap::new(),
            settings: DetectionSettings::default(),
            projects: Vec::new(),
        }
    }
}

impl LockdriftConfig {
    /// The folder importer keys are relative to
    pub fn importer_root(&self) -> &Path {
        match &self.importer_root {
            Some(root) => root,
            None => self.lockfile.parent().unwrap_or(Path::new("")),
        }
    }

    /// Find a project by name
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }
}

/// How drift is reported
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DetectionSettings {
    /// Collect every modification reason instead of stopping at the first
    #[serde(default)]
    pub report_all_reasons: bool,

    /// Compare the configured overrides with the ones in the lockfile
    #[serde(default = "default_true")]
    pub check_overrides: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            report_all_reasons: false,
            check_overrides: default_true(),
        }
    }
}

/// A workspace project
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Project {
    /// Package name, as in the project's `package.json`
    pub name: String,

    /// Project folder, relative to the workspace root
    pub path: PathBuf,

    /// Whether this project is checked by [`crate::ConfigManager::modified_projects`]
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_lockfile() -> PathBuf {
    PathBuf::from("pnpm-lock.yaml")
}

fn default_true() -> bool {
    true
}
