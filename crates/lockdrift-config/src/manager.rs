use crate::security::{validate_project_name, validate_project_path, SecurityError};
use crate::types::{LockdriftConfig, Project};
use lockdrift_deps::{
    LockfileSnapshot, ModificationDetector, ModificationReport, Overrides, WorkspaceProject,
};
use lockdrift_fs::{DefaultFileSystem, FileSystem};
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Deps(#[from] lockdrift_deps::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Unsupported config version '{0}' (expected 1.x)")]
    UnsupportedVersion(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project already exists: {0}")]
    ProjectExists(String),
}

/// Manager for a workspace's `lockdrift.toml`
///
/// Resolves configured projects to their lockfile importers and runs drift
/// detection for them. Every file is read through a [`FileSystem`]; all
/// configured paths are relative to the folder holding the config file.
pub struct ConfigManager<F: FileSystem = DefaultFileSystem> {
    fs: Arc<F>,
    config_path: PathBuf,
    workspace_dir: PathBuf,
    config: LockdriftConfig,
}

#[cfg(feature = "native-fs")]
impl ConfigManager<lockdrift_fs::NativeFileSystem> {
    /// Load config from a path on disk. The config file's folder becomes the
    /// filesystem root; nothing outside it is read.
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let workspace_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let fs = Arc::new(lockdrift_fs::NativeFileSystem::new(workspace_dir)?);
        let file_name = path
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::ConfigNotFound(path.to_path_buf()))?;

        Self::load_with_filesystem(fs, &file_name).await
    }
}

impl<F: FileSystem> ConfigManager<F> {
    /// Load config with a custom FileSystem
    pub async fn load_with_filesystem(fs: Arc<F>, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path).await? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs.read_to_string(path).await?;
        let config: LockdriftConfig = toml::from_str(&contents)?;
        let config = validate(config)?;

        tracing::debug!(
            config = %path.display(),
            projects = config.projects.len(),
            lockfile = %config.lockfile.display(),
            "loaded lockdrift config"
        );

        Ok(Self {
            fs,
            config_path: path.to_path_buf(),
            workspace_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            config,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &LockdriftConfig {
        &self.config
    }

    /// Where the config was read from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get a project by name
    pub fn project(&self, name: &str) -> Result<&Project, ConfigError> {
        self.config
            .project(name)
            .ok_or_else(|| ConfigError::ProjectNotFound(name.to_string()))
    }

    /// List all projects
    pub fn list_projects(&self) -> &[Project] {
        &self.config.projects
    }

    /// List enabled projects only
    pub fn list_enabled_projects(&self) -> Vec<&Project> {
        self.config.projects.iter().filter(|p| p.enabled).collect()
    }

    /// The lockfile importer key of a project: its folder relative to the
    /// importer root, `/`-separated, `.` for the root itself.
    pub fn importer_key(&self, project: &Project) -> String {
        relative_key(self.config.importer_root(), &project.path)
    }

    /// The configured overrides as parsed rules
    pub fn workspace_overrides(&self) -> Result<Overrides, ConfigError> {
        Ok(Overrides::from_map(self.config.overrides.clone())?)
    }

    /// Read a project's `package.json`.
    pub async fn project_view(&self, name: &str) -> Result<WorkspaceProject, ConfigError> {
        let project = self.project(name)?;
        let manifest = self.resolve(&project.path).join("package.json");
        let view = WorkspaceProject::load(&self.fs, &manifest, &self.importer_key(project)).await?;

        if view.name() != project.name {
            tracing::warn!(
                configured = %project.name,
                manifest = %view.name(),
                "project name differs from its package.json"
            );
        }

        Ok(view)
    }

    /// Load the configured lockfile. `Ok(None)` when it does not exist.
    pub async fn lockfile_snapshot(&self) -> Result<Option<LockfileSnapshot>, ConfigError> {
        let path = self.resolve(&self.config.lockfile);
        Ok(LockfileSnapshot::load_with_filesystem(&self.fs, &path).await?)
    }

    /// Check one project against an already loaded snapshot.
    pub async fn check_project(
        &self,
        name: &str,
        snapshot: &LockfileSnapshot,
    ) -> Result<ModificationReport, ConfigError> {
        let view = self.project_view(name).await?;
        Ok(self.detector()?.check(&view, snapshot))
    }

    /// Whether a project drifted from the lockfile. A missing lockfile means
    /// every project is modified.
    pub async fn is_project_modified(&self, name: &str) -> Result<bool, ConfigError> {
        self.project(name)?;
        match self.lockfile_snapshot().await? {
            Some(snapshot) => Ok(self.check_project(name, &snapshot).await?.is_modified()),
            None => Ok(true),
        }
    }

    /// Names of the enabled projects that drifted, loading the lockfile once.
    pub async fn modified_projects(&self) -> Result<Vec<String>, ConfigError> {
        let enabled = self.list_enabled_projects();
        let Some(snapshot) = self.lockfile_snapshot().await? else {
            return Ok(enabled.into_iter().map(|p| p.name.clone()).collect());
        };

        let mut modified = Vec::new();
        for project in enabled {
            if self.check_project(&project.name, &snapshot).await?.is_modified() {
                modified.push(project.name.clone());
            }
        }
        Ok(modified)
    }

    fn detector(&self) -> Result<ModificationDetector, ConfigError> {
        let detector =
            ModificationDetector::new().exhaustive(self.config.settings.report_all_reasons);
        if self.config.settings.check_overrides {
            Ok(detector.with_workspace_overrides(self.workspace_overrides()?))
        } else {
            Ok(detector)
        }
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.workspace_dir.join(relative)
    }
}

fn validate(mut config: LockdriftConfig) -> Result<LockdriftConfig, ConfigError> {
    if !config.version.starts_with("1.") && config.version != "1" {
        return Err(ConfigError::UnsupportedVersion(config.version));
    }

    config.lockfile = validate_project_path(&config.lockfile)?;
    if let Some(root) = &config.importer_root {
        config.importer_root = Some(validate_project_path(root)?);
    }

    let mut seen = HashSet::new();
    for project in &mut config.projects {
        validate_project_name(&project.name)?;
        project.path = validate_project_path(&project.path)?;
        if !seen.insert(project.name.clone()) {
            return Err(ConfigError::ProjectExists(project.name.clone()));
        }
    }

    Ok(config)
}

/// `to` relative to `from`, both normalized workspace-relative paths.
fn relative_key(from: &Path, to: &Path) -> String {
    let parts = |path: &Path| -> Vec<String> {
        path.components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    };
    let from = parts(from);
    let to = parts(to);

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let key: Vec<&str> = std::iter::repeat("..")
        .take(from.len() - common)
        .chain(to[common..].iter().map(String::as_str))
        .collect();

    if key.is_empty() {
        ".".to_string()
    } else {
        key.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockdrift_fs::MemoryFileSystem;

    const CONFIG: &str = r#"
version = "1.0"
lockfile = "common/config/rush/pnpm-lock.yaml"
importer_root = "common/temp"

[[projects]]
name = "foo"
path = "projects/foo"
"#;

    const LOCKFILE: &str = r#"
lockfileVersion: '6.0'
importers:
  ../../projects/foo:
    dependencies:
      tslib:
        specifier: ~2.3.1
        version: 2.3.1
"#;

    fn workspace(manifest: &str) -> Arc<MemoryFileSystem> {
        Arc::new(
            MemoryFileSystem::new("/repo")
                .unwrap()
                .with_file("lockdrift.toml", CONFIG)
                .unwrap()
                .with_file("common/config/rush/pnpm-lock.yaml", LOCKFILE)
                .unwrap()
                .with_file("projects/foo/package.json", manifest)
                .unwrap(),
        )
    }

    #[test]
    fn test_relative_key() {
        assert_eq!(
            relative_key(Path::new("common/temp"), Path::new("projects/foo")),
            "../../projects/foo"
        );
        assert_eq!(relative_key(Path::new(""), Path::new("projects/foo")), "projects/foo");
        assert_eq!(relative_key(Path::new("apps"), Path::new("apps/web")), "web");
        assert_eq!(relative_key(Path::new("apps"), Path::new("apps")), ".");
    }

    #[tokio::test]
    async fn test_unmodified_project() {
        let fs = workspace(r#"{"name": "foo", "dependencies": {"tslib": "~2.3.1"}}"#);
        let manager = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml"))
            .await
            .unwrap();

        let project = manager.project("foo").unwrap();
        assert_eq!(manager.importer_key(project), "../../projects/foo");
        assert!(!manager.is_project_modified("foo").await.unwrap());
        assert!(manager.modified_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_modified_project() {
        let fs = workspace(r#"{"name": "foo", "dependencies": {"tslib": "^2.4.0"}}"#);
        let manager = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml"))
            .await
            .unwrap();

        assert!(manager.is_project_modified("foo").await.unwrap());
        assert_eq!(manager.modified_projects().await.unwrap(), vec!["foo".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let fs = workspace(r#"{"name": "foo"}"#);
        let manager = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml"))
            .await
            .unwrap();

        let result = manager.is_project_modified("bar").await;
        assert!(matches!(result, Err(ConfigError::ProjectNotFound(name)) if name == "bar"));
    }

    #[tokio::test]
    async fn test_missing_config() {
        let fs = Arc::new(MemoryFileSystem::new("/repo").unwrap());
        let result = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml")).await;
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_project() {
        let config = format!("{CONFIG}\n[[projects]]\nname = \"foo\"\npath = \"projects/other\"\n");
        let fs = Arc::new(
            MemoryFileSystem::new("/repo")
                .unwrap()
                .with_file("lockdrift.toml", config)
                .unwrap(),
        );

        let result = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml")).await;
        assert!(matches!(result, Err(ConfigError::ProjectExists(_))));
    }

    #[tokio::test]
    async fn test_escaping_project_path() {
        let fs = Arc::new(
            MemoryFileSystem::new("/repo")
                .unwrap()
                .with_file(
                    "lockdrift.toml",
                    "[[projects]]\nname = \"foo\"\npath = \"../outside\"\n",
                )
                .unwrap(),
        );

        let result = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml")).await;
        assert!(matches!(
            result,
            Err(ConfigError::Security(SecurityError::PathEscapesWorkspace(_)))
        ));
    }

    #[tokio::test]
    async fn test_configured_overrides_drift() {
        let config = CONFIG.replace(
            "[[projects]]",
            "[overrides]\ntypescript = \"4.7.4\"\n\n[[projects]]",
        );
        let fs = Arc::new(
            MemoryFileSystem::new("/repo")
                .unwrap()
                .with_file("lockdrift.toml", config)
                .unwrap()
                .with_file("common/config/rush/pnpm-lock.yaml", LOCKFILE)
                .unwrap()
                .with_file(
                    "projects/foo/package.json",
                    r#"{"name": "foo", "dependencies": {"tslib": "~2.3.1"}}"#,
                )
                .unwrap(),
        );
        let manager = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml"))
            .await
            .unwrap();

        let snapshot = manager.lockfile_snapshot().await.unwrap().unwrap();
        let report = manager.check_project("foo", &snapshot).await.unwrap();
        assert_eq!(
            report.reasons(),
            &[lockdrift_deps::ModificationReason::OverridesChanged]
        );
    }

    #[tokio::test]
    async fn test_missing_lockfile_marks_everything_modified() {
        let fs = Arc::new(
            MemoryFileSystem::new("/repo")
                .unwrap()
                .with_file("lockdrift.toml", CONFIG)
                .unwrap(),
        );
        let manager = ConfigManager::load_with_filesystem(fs, Path::new("lockdrift.toml"))
            .await
            .unwrap();

        assert!(manager.lockfile_snapshot().await.unwrap().is_none());
        assert!(manager.is_project_modified("foo").await.unwrap());
    }
}
