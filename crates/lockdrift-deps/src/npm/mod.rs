//! npm manifest support
//!
//! Workspace projects are read from their `package.json`.

pub mod manifest;

pub use manifest::WorkspaceProject;
