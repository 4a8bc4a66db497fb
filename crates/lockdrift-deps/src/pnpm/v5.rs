//! Lockfile major version 5
//!
//! ```yaml
//! lockfileVersion: 5.4
//! importers:
//!   projects/foo:
//!     specifiers:
//!       tslib: ~2.3.1
//!     dependencies:
//!       tslib: 2.3.1
//! packages:
//!   /tslib/2.3.1:
//!     resolution: {integrity: sha512-...}
//! ```

use super::lockfile::{DocumentParts, PackageDoc};
use super::{resolution_key, Importer, LockedDependency};
use crate::types::DependencyKind;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Document {
    #[serde(default)]
    importers: Option<BTreeMap<String, ImporterDoc>>,

    // Single-project lockfiles keep the root importer at the top level.
    #[serde(default)]
    specifiers: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    overrides: BTreeMap<String, String>,
    #[serde(default)]
    packages: BTreeMap<String, PackageDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImporterDoc {
    #[serde(default)]
    specifiers: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, String>,
}

impl Document {
    pub(super) fn into_parts(self) -> DocumentParts {
        let importers = match self.importers {
            Some(importers) => importers
                .into_iter()
                .map(|(key, doc)| (super::normalize_importer_key(&key), doc.into_importer()))
                .collect(),
            None => {
                let root = ImporterDoc {
                    specifiers: self.specifiers,
                    dependencies: self.dependencies,
                    dev_dependencies: self.dev_dependencies,
                    optional_dependencies: self.optional_dependencies,
                };
                BTreeMap::from([(".".to_string(), root.into_importer())])
            }
        };

        DocumentParts {
            importers,
            overrides: self.overrides,
            auto_install_peers: false,
            packages: self.packages,
        }
    }
}

impl ImporterDoc {
    fn into_importer(mut self) -> Importer {
        let mut importer = Importer::default();
        let blocks = [
            (DependencyKind::Regular, std::mem::take(&mut self.dependencies)),
            (DependencyKind::Dev, std::mem::take(&mut self.dev_dependencies)),
            (DependencyKind::Optional, std::mem::take(&mut self.optional_dependencies)),
        ];

        for (kind, block) in blocks {
            for (name, version) in block {
                let dependency = LockedDependency {
                    specifier: self.specifiers.get(&name).cloned(),
                    resolution_key: resolution_key(&name, &version, '/'),
                    version,
                };
                importer.insert(kind, name, dependency);
            }
        }

        importer
    }
}
