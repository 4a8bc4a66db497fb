//! Lockfile major version 6
//!
//! ```yaml
//! lockfileVersion: '6.0'
//! importers:
//!   projects/foo:
//!     dependencies:
//!       tslib:
//!         specifier: ~2.3.1
//!         version: 2.3.1
//! packages:
//!   /tslib@2.3.1:
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

    #[serde(default)]
    dependencies: BTreeMap<String, DependencyDoc>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, DependencyDoc>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, DependencyDoc>,

    #[serde(default)]
    settings: SettingsDoc,
    #[serde(default)]
    overrides: BTreeMap<String, String>,
    #[serde(default)]
    packages: BTreeMap<String, PackageDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDoc {
    #[serde(default)]
    auto_install_peers: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImporterDoc {
    #[serde(default)]
    dependencies: BTreeMap<String, DependencyDoc>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, DependencyDoc>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, DependencyDoc>,
}

#[derive(Debug, Deserialize)]
struct DependencyDoc {
    #[serde(default)]
    specifier: Option<String>,
    version: String,
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
            auto_install_peers: self.settings.auto_install_peers,
            packages: self.packages,
        }
    }
}

impl ImporterDoc {
    fn into_importer(self) -> Importer {
        let mut importer = Importer::default();
        let blocks = [
            (DependencyKind::Regular, self.dependencies),
            (DependencyKind::Dev, self.dev_dependencies),
            (DependencyKind::Optional, self.optional_dependencies),
        ];

        for (kind, block) in blocks {
            for (name, doc) in block {
                let dependency = LockedDependency {
                    specifier: doc.specifier,
                    resolution_key: resolution_key(&name, &doc.version, '@'),
                    version: doc.version,
                };
                importer.insert(kind, name, dependency);
            }
        }

        importer
    }
}

#[cfg(test)]
mod tests {
    use crate::{DependencyKind, LockfileSnapshot, LockfileVersion};
    use std::path::Path;

    #[test]
    fn test_peer_suffixed_keys_resolve() {
        let yaml = r#"
lockfileVersion: '6.0'
importers:
  .:
    dependencies:
      '@rushstack/heft':
        specifier: ^0.53.0
        version: 0.53.1(@types/node@14.18.36)
      bar:
        specifier: workspace:*
        version: link:../bar
packages:
  /@rushstack/heft@0.53.1(@types/node@14.18.36):
    resolution: {integrity: sha512-heft}
    peerDependencies:
      '@types/node': '*'
    dependencies:
      '@types/node': 14.18.36
"#;
        let snapshot = LockfileSnapshot::from_yaml_str(Path::new("pnpm-lock.yaml"), yaml).unwrap();
        assert_eq!(snapshot.major_version(), 6);
        assert_eq!(snapshot.version(), LockfileVersion::V6);

        let root = snapshot.importer(".").unwrap();
        let heft = root.get(DependencyKind::Regular, "@rushstack/heft").unwrap();
        assert_eq!(
            heft.resolution_key.as_deref(),
            Some("/@rushstack/heft@0.53.1(@types/node@14.18.36)")
        );

        let package = snapshot.resolve(heft).unwrap();
        assert_eq!(package.name, "@rushstack/heft");
        assert_eq!(package.version, "0.53.1");
        assert_eq!(package.peer_suffix.as_deref(), Some("(@types/node@14.18.36)"));
        assert_eq!(package.integrity.as_deref(), Some("sha512-heft"));
        assert_eq!(package.peer_dependencies.len(), 1);

        let bar = root.get(DependencyKind::Regular, "bar").unwrap();
        assert!(bar.resolution_key.is_none());
        assert!(snapshot.resolve(bar).is_none());
        assert!(!snapshot.auto_install_peers());
    }

    #[test]
    fn test_settings_block() {
        let yaml = r#"
lockfileVersion: '6.0'
settings:
  autoInstallPeers: true
  excludeLinksFromLockfile: false
dependencies:
  react:
    specifier: ^18.2.0
    version: 18.2.0
"#;
        let snapshot = LockfileSnapshot::from_yaml_str(Path::new("pnpm-lock.yaml"), yaml).unwrap();
        assert!(snapshot.auto_install_peers());
    }
}
