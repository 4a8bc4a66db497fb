//! Core traits for drift detection

use crate::types::DependencyKind;
use std::collections::BTreeMap;

/// Read-only view of a workspace project, as consumed by the detector
///
/// This trait decouples drift detection from the way projects are discovered
/// and configured. [`crate::WorkspaceProject`] implements it for projects read
/// from a `package.json`; hosts with their own project registry can implement
/// it directly.
pub trait WorkspaceProjectView: Send + Sync {
    /// The project's importer key in the lockfile: its folder relative to the
    /// lockfile's importer root, `/`-separated, `.` for the root itself.
    fn importer_key(&self) -> &str;

    /// Declared `name -> specifier` pairs of one kind, `None` when the
    /// manifest has no such block.
    fn declared_dependencies(&self, kind: DependencyKind) -> Option<&BTreeMap<String, String>>;
}

impl<T: WorkspaceProjectView + ?Sized> WorkspaceProjectView for &T {
    fn importer_key(&self) -> &str {
        (**self).importer_key()
    }

    fn declared_dependencies(&self, kind: DependencyKind) -> Option<&BTreeMap<String, String>> {
        (**self).declared_dependencies(kind)
    }
}
