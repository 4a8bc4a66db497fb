//! Workspace configuration for lockdrift
//!
//! A `lockdrift.toml` at the workspace root names the pnpm lockfile, the
//! folder its importer keys are relative to, workspace-level overrides and
//! the projects to check. [`ConfigManager`] turns that into project views and
//! drift verdicts.

pub mod manager;
pub mod security;
pub mod types;

pub use manager::{ConfigError, ConfigManager};
pub use security::{validate_project_name, validate_project_path, SecurityError};
pub use types::{DetectionSettings, LockdriftConfig, Project};
