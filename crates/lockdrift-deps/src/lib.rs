//! # lockdrift-deps
//!
//! Lockfile dependency-specifier parsing and workspace drift detection for
//! pnpm monorepos.
//!
//! This crate provides functionality to:
//! - Parse pnpm resolution keys (`/name/1.0.0`, `/@scope/name@1.0.0(peer@2.0.0)`,
//!   git source references) into typed [`DependencySpecifier`]s
//! - Load `pnpm-lock.yaml` documents of lockfile major version 5 and 6 into one
//!   normalized [`LockfileSnapshot`]
//! - Read the dependencies a workspace project declares in its `package.json`
//! - Decide whether a project's declarations drifted from what the lockfile
//!   recorded, so an install step can be skipped safely
//!
//! Nothing here resolves dependencies, writes the lockfile, or touches the network.
//!
//! ## Architecture
//!
//! - [`specifier`] is a pure, stateless parser (leaf)
//! - [`pnpm`] loads the lockfile, dispatching on `lockfileVersion` to one
//!   traversal per dialect that all produce the same snapshot shape
//! - [`detector`] compares a [`WorkspaceProjectView`] against a snapshot and
//!   never looks at the lockfile version
//!
//! ## Example
//!
//! ```rust,no_run
//! use lockdrift_deps::{is_workspace_project_modified, LockfileSnapshot, WorkspaceProject};
//! use std::path::Path;
//!
//! # fn example() -> lockdrift_deps::Result<()> {
//! let Some(snapshot) = LockfileSnapshot::load_from_file(Path::new("pnpm-lock.yaml"))? else {
//!     println!("no lockfile, everything needs an install");
//!     return Ok(());
//! };
//!
//! let contents = std::fs::read_to_string("packages/app/package.json")?;
//! let project = WorkspaceProject::from_package_json(
//!     "packages/app",
//!     &contents,
//!     Path::new("packages/app/package.json"),
//! )?;
//!
//! if is_workspace_project_modified(&project, &snapshot) {
//!     println!("{} needs an install", project.name());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod detector;
pub mod error;
pub mod npm;
pub mod overrides;
pub mod pnpm;
pub mod specifier;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types and traits
pub use error::{Error, Result};
pub use traits::WorkspaceProjectView;
pub use types::DependencyKind;

pub use specifier::{parse_dependency_key, DependencySpecifier, DependencySpecifierType};

pub use overrides::{OverrideRule, Overrides, PackagePattern};

pub use pnpm::{
    Importer, LockedDependency, LockfileSnapshot, LockfileVersion, ResolvedPackage,
};

pub use npm::WorkspaceProject;

pub use detector::{
    is_workspace_project_modified, is_workspace_project_modified_async, ModificationDetector,
    ModificationReason, ModificationReport,
};
