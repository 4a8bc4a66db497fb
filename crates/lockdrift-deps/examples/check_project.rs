//! Example: Check whether a workspace project needs a fresh install
//!
//! Run with: cargo run --package lockdrift-deps --example check_project -- <pnpm-lock.yaml> <project dir> <importer key>

use lockdrift_deps::{
    parse_dependency_key, DependencyKind, LockfileSnapshot, ModificationDetector, WorkspaceProject,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let lockfile = PathBuf::from(args.next().unwrap_or_else(|| "pnpm-lock.yaml".to_string()));
    let project_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let importer_key = args.next().unwrap_or_else(|| ".".to_string());

    println!("=== lockdrift-deps: Project Drift ===\n");

    let Some(snapshot) = LockfileSnapshot::load_from_file(&lockfile)? else {
        println!("{} not found: every project needs an install", lockfile.display());
        return Ok(());
    };
    println!(
        "Lockfile: {} (major version {})",
        snapshot.path().display(),
        snapshot.major_version()
    );

    let manifest_path = project_dir.join("package.json");
    let contents = std::fs::read_to_string(&manifest_path)?;
    let project = WorkspaceProject::from_package_json(&importer_key, &contents, &manifest_path)?;
    println!("Project:  {} (importer '{}')\n", project.name(), importer_key);

    if let Some(importer) = snapshot.importer(&importer_key) {
        for kind in DependencyKind::INSTALLED {
            for (name, locked) in importer.dependencies(kind) {
                let parsed = parse_dependency_key(name, &locked.version)
                    .map(|spec| format!("{} {}", spec.specifier_type(), spec.version_specifier()))
                    .unwrap_or_else(|| "unparsed".to_string());
                println!(
                    "  [{kind}] {name}: {} -> {parsed}",
                    locked.specifier.as_deref().unwrap_or("?")
                );
            }
        }
        println!();
    }

    let report = ModificationDetector::new()
        .exhaustive(true)
        .check(&project, &snapshot);

    if report.is_modified() {
        println!("✗ {} drifted from the lockfile:", project.name());
        for reason in report.reasons() {
            println!("  - {reason}");
        }
    } else {
        println!("✓ {} matches the lockfile", project.name());
    }

    Ok(())
}
