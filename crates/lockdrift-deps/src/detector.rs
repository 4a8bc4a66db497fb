//! Workspace drift detection
//!
//! Decides whether the dependencies a workspace project declares still match
//! what the lockfile recorded for it. When they match, the project can skip a
//! fresh install. Nothing is resolved and no ranges are evaluated: declared
//! specifiers are compared with the specifiers recorded at lock time.

use crate::pnpm::{Importer, LockedDependency, LockfileSnapshot};
use crate::specifier::{parse_dependency_key, DependencySpecifier, DependencySpecifierType};
use crate::{DependencyKind, Overrides, Result, WorkspaceProjectView};
use lockdrift_fs::FileSystem;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

/// Why a project counts as modified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationReason {
    /// The lockfile has no importer for the project
    ImporterMissing {
        /// The importer key that was looked up
        importer: String,
    },
    /// The workspace overrides differ from the ones recorded in the lockfile
    OverridesChanged,
    /// A declared dependency was never recorded
    MissingFromLockfile {
        /// Dependency name
        name: String,
    },
    /// A recorded dependency is no longer declared
    NotDeclared {
        /// Dependency name
        name: String,
    },
    /// The dependency moved to a kind the lockfile did not record it under
    KindChanged {
        /// Dependency name
        name: String,
        /// The kind that wins among the declarations
        declared: DependencyKind,
    },
    /// No declared specifier matches a usable recorded one
    SpecifierChanged {
        /// Dependency name
        name: String,
        /// Effective declared specifiers (after overrides)
        declared: Vec<String>,
        /// Specifiers recorded at lock time
        recorded: Vec<String>,
    },
}

impl fmt::Display for ModificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModificationReason::ImporterMissing { importer } => {
                write!(f, "no importer '{importer}' in the lockfile")
            }
            ModificationReason::OverridesChanged => f.write_str("overrides changed"),
            ModificationReason::MissingFromLockfile { name } => {
                write!(f, "'{name}' is not in the lockfile")
            }
            ModificationReason::NotDeclared { name } => {
                write!(f, "'{name}' is in the lockfile but no longer declared")
            }
            ModificationReason::KindChanged { name, declared } => {
                write!(f, "'{name}' is now declared in {declared}")
            }
            ModificationReason::SpecifierChanged {
                name,
                declared,
                recorded,
            } => write!(
                f,
                "'{name}' declared as {} but locked as {}",
                declared.join(", "),
                if recorded.is_empty() {
                    "nothing usable".to_string()
                } else {
                    recorded.join(", ")
                }
            ),
        }
    }
}

/// Result of a drift check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationReport {
    reasons: Vec<ModificationReason>,
}

impl ModificationReport {
    /// True when the project drifted from the lockfile
    pub fn is_modified(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// The reasons found; only the first one unless the detector is exhaustive
    pub fn reasons(&self) -> &[ModificationReason] {
        &self.reasons
    }
}

/// Compares workspace projects against a lockfile snapshot
///
/// # Example
///
/// ```
/// use lockdrift_deps::{DependencyKind, LockfileSnapshot, ModificationDetector, WorkspaceProject};
/// use std::path::Path;
///
/// let snapshot = LockfileSnapshot::from_yaml_str(
///     Path::new("pnpm-lock.yaml"),
///     "lockfileVersion: '6.0'\ndependencies:\n  tslib:\n    specifier: ~2.3.1\n    version: 2.3.1\n",
/// )
/// .unwrap();
///
/// let project = WorkspaceProject::new("app", ".")
///     .with_dependency(DependencyKind::Regular, "tslib", "^2.4.0");
///
/// let report = ModificationDetector::new().check(&project, &snapshot);
/// assert!(report.is_modified());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModificationDetector {
    workspace_overrides: Option<Overrides>,
    exhaustive: bool,
}

impl ModificationDetector {
    /// Create a detector that stops at the first reason
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the lockfile's recorded overrides with the workspace's current
    /// ones; any difference marks every project as modified.
    pub fn with_workspace_overrides(mut self, overrides: Overrides) -> Self {
        self.workspace_overrides = Some(overrides);
        self
    }

    /// Collect every reason instead of stopping at the first one.
    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Check one project.
    pub fn check<P>(&self, project: &P, snapshot: &LockfileSnapshot) -> ModificationReport
    where
        P: WorkspaceProjectView + ?Sized,
    {
        let mut findings = Findings {
            reasons: Vec::new(),
            exhaustive: self.exhaustive,
        };
        let _ = self.inspect(project, snapshot, &mut findings);

        if findings.reasons.is_empty() {
            tracing::debug!(importer = project.importer_key(), "workspace project not modified");
        }

        ModificationReport {
            reasons: findings.reasons,
        }
    }

    /// Shorthand for `check(..).is_modified()`.
    pub fn is_modified<P>(&self, project: &P, snapshot: &LockfileSnapshot) -> bool
    where
        P: WorkspaceProjectView + ?Sized,
    {
        self.check(project, snapshot).is_modified()
    }

    fn inspect<P>(
        &self,
        project: &P,
        snapshot: &LockfileSnapshot,
        findings: &mut Findings,
    ) -> ControlFlow<()>
    where
        P: WorkspaceProjectView + ?Sized,
    {
        let importer_key = project.importer_key();
        let Some(importer) = snapshot.importer(importer_key) else {
            return findings.flag(
                importer_key,
                ModificationReason::ImporterMissing {
                    importer: importer_key.to_string(),
                },
            );
        };

        if let Some(overrides) = &self.workspace_overrides {
            if overrides != snapshot.overrides() {
                findings.flag(importer_key, ModificationReason::OverridesChanged)?;
            }
        }

        let mut declared: BTreeMap<&str, Vec<(DependencyKind, &str)>> = BTreeMap::new();
        for kind in DependencyKind::INSTALLED {
            for (name, specifier) in project.declared_dependencies(kind).into_iter().flatten() {
                declared
                    .entry(name.as_str())
                    .or_default()
                    .push((kind, specifier.as_str()));
            }
        }
        // Peers are only recorded when the package manager installed them.
        let auto_installed_peers: BTreeMap<&str, &str> = if snapshot.auto_install_peers() {
            project
                .declared_dependencies(DependencyKind::Peer)
                .into_iter()
                .flatten()
                .filter(|(name, _)| !declared.contains_key(name.as_str()))
                .map(|(name, range)| (name.as_str(), range.as_str()))
                .collect()
        } else {
            BTreeMap::new()
        };

        let recorded_names = importer.names();
        for name in declared.keys() {
            if !recorded_names.contains(name) {
                findings.flag(
                    importer_key,
                    ModificationReason::MissingFromLockfile {
                        name: name.to_string(),
                    },
                )?;
            }
        }
        for name in &recorded_names {
            if !declared.contains_key(name) && !auto_installed_peers.contains_key(name) {
                findings.flag(
                    importer_key,
                    ModificationReason::NotDeclared {
                        name: name.to_string(),
                    },
                )?;
            }
        }

        for (name, declarations) in &declared {
            if recorded_names.contains(name) {
                compare_dependency(name, declarations, importer, snapshot, importer_key, findings)?;
            }
        }
        for (name, range) in &auto_installed_peers {
            if recorded_names.contains(name) {
                let declarations = [(DependencyKind::Peer, *range)];
                compare_dependency(name, &declarations, importer, snapshot, importer_key, findings)?;
            }
        }

        ControlFlow::Continue(())
    }
}

struct Findings {
    reasons: Vec<ModificationReason>,
    exhaustive: bool,
}

impl Findings {
    fn flag(&mut self, importer: &str, reason: ModificationReason) -> ControlFlow<()> {
        tracing::debug!(importer, %reason, "workspace project modified");
        self.reasons.push(reason);
        if self.exhaustive {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

fn compare_dependency(
    name: &str,
    declarations: &[(DependencyKind, &str)],
    importer: &Importer,
    snapshot: &LockfileSnapshot,
    importer_key: &str,
    findings: &mut Findings,
) -> ControlFlow<()> {
    let recorded: Vec<(DependencyKind, &LockedDependency)> = importer.entries(name).collect();

    // The package manager keeps a name declared under several kinds only
    // under the kind with the highest precedence. Auto-installed peers land
    // in whichever block it picks.
    if let Some(winner) = declarations
        .iter()
        .map(|(kind, _)| *kind)
        .filter(|kind| *kind != DependencyKind::Peer)
        .max_by_key(|kind| kind.precedence())
    {
        if !recorded.iter().any(|(kind, _)| *kind == winner) {
            return findings.flag(
                importer_key,
                ModificationReason::KindChanged {
                    name: name.to_string(),
                    declared: winner,
                },
            );
        }
    }

    let declared: Vec<DependencySpecifier> = declarations
        .iter()
        .map(|&(_, raw)| {
            let effective = snapshot
                .overrides()
                .for_direct_dependency(name, raw)
                .unwrap_or(raw);
            DependencySpecifier::parse(name, effective)
        })
        .collect();

    let usable: Vec<DependencySpecifier> = recorded
        .iter()
        .filter_map(|(_, dependency)| usable_specifier(name, dependency))
        .collect();

    // Unsupported forms such as dist-tags compare by their raw text, so an
    // unchanged `latest` on both sides still counts as a match.
    let matched = declared
        .iter()
        .any(|declared| usable.iter().any(|recorded| declared.is_equivalent(recorded)));

    tracing::trace!(
        name,
        declared = declared.len(),
        usable = usable.len(),
        matched,
        "compared dependency specifiers"
    );

    if matched {
        return ControlFlow::Continue(());
    }

    findings.flag(
        importer_key,
        ModificationReason::SpecifierChanged {
            name: name.to_string(),
            declared: declared
                .iter()
                .map(|spec| spec.version_specifier().to_string())
                .collect(),
            recorded: recorded
                .iter()
                .filter_map(|(_, dependency)| dependency.specifier.clone())
                .collect(),
        },
    )
}

/// The recorded specifier of an entry, when the entry can be trusted for
/// comparison: a specifier was recorded and the resolution is understood.
fn usable_specifier(name: &str, dependency: &LockedDependency) -> Option<DependencySpecifier> {
    let recorded = DependencySpecifier::parse(name, dependency.specifier.as_deref()?);

    if dependency.version.starts_with("link:") {
        return matches!(
            recorded.specifier_type(),
            DependencySpecifierType::Workspace
                | DependencySpecifierType::Range
                | DependencySpecifierType::Version
        )
        .then_some(recorded);
    }

    let resolved = parse_dependency_key(name, &dependency.version)?;

    // An exact specifier must have resolved to exactly that version.
    if recorded.specifier_type() == DependencySpecifierType::Version
        && resolved.specifier_type() == DependencySpecifierType::Version
        && resolved.version_specifier() != recorded.version_specifier()
    {
        return None;
    }

    Some(recorded)
}

/// Whether `project` drifted from what `snapshot` recorded for it.
///
/// Overrides are taken from the lockfile alone; use
/// [`ModificationDetector::with_workspace_overrides`] to also compare the
/// workspace's current overrides.
pub fn is_workspace_project_modified<P>(project: &P, snapshot: &LockfileSnapshot) -> bool
where
    P: WorkspaceProjectView + ?Sized,
{
    ModificationDetector::new().is_modified(project, snapshot)
}

/// Load the lockfile at `lockfile_path` and check `project` against it.
///
/// A missing lockfile means every project is modified.
///
/// # Errors
/// Returns an error if the lockfile exists but cannot be read or parsed.
pub async fn is_workspace_project_modified_async<F, P>(
    fs: &Arc<F>,
    lockfile_path: &Path,
    project: &P,
) -> Result<bool>
where
    F: FileSystem,
    P: WorkspaceProjectView + ?Sized,
{
    match LockfileSnapshot::load_with_filesystem(fs, lockfile_path).await? {
        Some(snapshot) => Ok(is_workspace_project_modified(project, &snapshot)),
        None => Ok(true),
    }
}
