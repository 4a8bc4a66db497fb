//! Dependency specifier parsing
//!
//! Two entry points classify specifier strings into a [`DependencySpecifier`]:
//!
//! - [`DependencySpecifier::parse`] reads what a manifest declares (`^1.2.0`,
//!   `workspace:*`, `npm:other@1.0.0`, a git URL, ...).
//! - [`parse_dependency_key`] reads what a pnpm lockfile recorded as the
//!   resolution of a dependency (`1.4.0`, `/name/1.4.0_peer@1.0.0`,
//!   `/@scope/name@1.4.0(peer@1.0.0)`, `github.com/owner/repo/<commit>`).
//!
//! Both are pure functions of their input.

use crate::version::{is_exact_version, is_version_range, split_install_path};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Optional registry host, then `/name` or `/@scope/name`, then `/` or `@`
/// and the install path (version plus any peer annotation).
static RESOLUTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/(]*/((?:@[^/(]+/)?[^/(]+)[/@](.*)$").unwrap());

/// Host-qualified source reference ending in a commit hash, e.g.
/// `github.com/owner/repo/<sha>` or `git@bitbucket.com+owner/repo/<sha>`.
static SOURCE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:@|git@)?[a-z0-9-]+(?:\.[a-z0-9-]+)+[/+][^/]+/[^/]+[/+][a-f0-9]+$").unwrap()
});

static URL_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+:").unwrap());

/// `owner/repo` with an optional `#committish`, the npm shorthand for GitHub.
static GITHUB_SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+(?:#.+)?$").unwrap());

const REMOTE_PREFIXES: &[&str] = &[
    "git+", "git://", "git@", "github:", "gitlab:", "bitbucket:", "gist:", "http://", "https://",
];

const PATH_PREFIXES: &[&str] = &["./", "../", "/", "~/"];

const LOCAL_SCHEMES: &[&str] = &["file:", "link:", "portal:"];

/// Classification of a specifier string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySpecifierType {
    /// One exact version (`1.4.0`, `1.4.0-prerelease.0`)
    Version,
    /// A version range (`^1.0.0`, `~2.1`, `>=1 <2`, `*`)
    Range,
    /// Another package installed under this name (`npm:target@spec`)
    Alias,
    /// A source checkout: git, tarball URL or path
    Directory,
    /// A sibling workspace project (`workspace:*`)
    Workspace,
    /// Anything else, such as a dist-tag or a local `file:` reference
    Unsupported,
}

impl fmt::Display for DependencySpecifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencySpecifierType::Version => "version",
            DependencySpecifierType::Range => "range",
            DependencySpecifierType::Alias => "alias",
            DependencySpecifierType::Directory => "directory",
            DependencySpecifierType::Workspace => "workspace",
            DependencySpecifierType::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// A classified dependency specifier
///
/// For [`DependencySpecifierType::Alias`] the version specifier is always the
/// canonical `npm:<target>@<spec>` form, whichever way it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencySpecifier {
    package_name: String,
    specifier_type: DependencySpecifierType,
    version_specifier: String,
}

impl DependencySpecifier {
    /// Build a specifier from already classified parts.
    pub fn new(
        package_name: impl Into<String>,
        specifier_type: DependencySpecifierType,
        version_specifier: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            specifier_type,
            version_specifier: version_specifier.into(),
        }
    }

    /// Classify a declared specifier, as written in a `package.json` or in a
    /// lockfile's recorded `specifier` field.
    ///
    /// Every input yields a specifier; inputs that fit no known shape are
    /// [`DependencySpecifierType::Unsupported`].
    ///
    /// ```
    /// use lockdrift_deps::{DependencySpecifier, DependencySpecifierType};
    ///
    /// let spec = DependencySpecifier::parse("left-pad", "^1.3.0");
    /// assert_eq!(spec.specifier_type(), DependencySpecifierType::Range);
    ///
    /// let alias = DependencySpecifier::parse("lodash", "npm:lodash-es");
    /// assert_eq!(alias.version_specifier(), "npm:lodash-es@*");
    /// ```
    pub fn parse(package_name: &str, raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(rest) = raw.strip_prefix("workspace:") {
            return Self::new(package_name, DependencySpecifierType::Workspace, rest);
        }

        if let Some(target) = raw.strip_prefix("npm:") {
            let (target_name, target_spec) = split_alias_target(target);
            let target_spec = if target_spec.is_empty() { "*" } else { target_spec };
            return Self::new(
                package_name,
                DependencySpecifierType::Alias,
                format!("npm:{target_name}@{target_spec}"),
            );
        }

        if LOCAL_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
            return Self::new(package_name, DependencySpecifierType::Unsupported, raw);
        }

        if REMOTE_PREFIXES.iter().any(|prefix| raw.starts_with(prefix))
            || PATH_PREFIXES.iter().any(|prefix| raw.starts_with(prefix))
            || GITHUB_SHORTHAND.is_match(raw)
        {
            return Self::new(package_name, DependencySpecifierType::Directory, raw);
        }

        let specifier_type = if is_exact_version(raw) {
            DependencySpecifierType::Version
        } else if is_version_range(raw) {
            DependencySpecifierType::Range
        } else {
            DependencySpecifierType::Unsupported
        };

        Self::new(package_name, specifier_type, raw)
    }

    /// The dependency name this specifier was declared under
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// How the specifier was classified
    pub fn specifier_type(&self) -> DependencySpecifierType {
        self.specifier_type
    }

    /// The version part (canonical `npm:` form for aliases)
    pub fn version_specifier(&self) -> &str {
        &self.version_specifier
    }

    /// For aliases, the `(target name, target spec)` pair.
    pub fn alias_target(&self) -> Option<(&str, &str)> {
        if self.specifier_type != DependencySpecifierType::Alias {
            return None;
        }
        self.version_specifier
            .strip_prefix("npm:")
            .map(split_alias_target)
    }

    /// Two specifiers are equivalent when they have the same type and the
    /// same version specifier. The package name is the lookup key and is not
    /// compared.
    pub fn is_equivalent(&self, other: &DependencySpecifier) -> bool {
        self.specifier_type == other.specifier_type
            && self.version_specifier == other.version_specifier
    }
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.package_name, self.version_specifier)
    }
}

/// Split `name@spec` where `name` may be scoped (`@scope/name@spec`).
fn split_alias_target(target: &str) -> (&str, &str) {
    let search_from = usize::from(target.starts_with('@'));
    match target[search_from..].find('@') {
        Some(idx) => {
            let at = search_from + idx;
            (&target[..at], &target[at + 1..])
        }
        None => (target, ""),
    }
}

/// Parse a dependency version as recorded in a pnpm lockfile.
///
/// Returns `None` when the string is not understood: local references
/// (`file:`, `link:`), or a version part that is neither semver nor a source
/// reference.
///
/// ```
/// use lockdrift_deps::{parse_dependency_key, DependencySpecifierType};
///
/// let spec = parse_dependency_key("dependency_name", "/dependency_name/1.4.0").unwrap();
/// assert_eq!(spec.specifier_type(), DependencySpecifierType::Version);
/// assert_eq!(spec.version_specifier(), "1.4.0");
///
/// assert!(parse_dependency_key("dependency_name", "file:///path/to/file").is_none());
/// ```
pub fn parse_dependency_key(
    dependency_name: &str,
    raw: &str,
) -> Option<DependencySpecifier> {
    if raw.is_empty() || URL_SCHEME.is_match(raw) {
        return None;
    }

    let (package_name, install_path) = match RESOLUTION_KEY.captures(raw) {
        Some(caps) => (
            caps.get(1).map_or(dependency_name, |m| m.as_str()),
            caps.get(2).map_or("", |m| m.as_str()),
        ),
        None => (dependency_name, raw),
    };

    let (version, _peers) = split_install_path(install_path);

    if !is_exact_version(version) {
        if SOURCE_REFERENCE.is_match(raw) {
            return Some(DependencySpecifier::new(
                dependency_name,
                DependencySpecifierType::Directory,
                raw,
            ));
        }
        return None;
    }

    if package_name == dependency_name {
        Some(DependencySpecifier::new(
            dependency_name,
            DependencySpecifierType::Version,
            version,
        ))
    } else {
        Some(DependencySpecifier::new(
            dependency_name,
            DependencySpecifierType::Alias,
            format!("npm:{package_name}@{version}"),
        ))
    }
}

/// A packages-table key split into name, version and raw peer annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolutionKeyParts<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub peer_suffix: Option<&'a str>,
}

/// Split a packages-table key such as `/name/1.0.0_peer@2.0.0` or
/// `/@scope/name@1.0.0(peer@2.0.0)`.
///
/// Keys whose version part is not a semver version (git and tarball sources)
/// are not split; the package entry carries its own name and version then.
pub(crate) fn split_resolution_key(key: &str) -> Option<ResolutionKeyParts<'_>> {
    let caps = RESOLUTION_KEY.captures(key)?;
    let name = caps.get(1)?.as_str();
    let (version, peer_suffix) = split_install_path(caps.get(2)?.as_str());

    is_exact_version(version).then_some(ResolutionKeyParts {
        name,
        version,
        peer_suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DEPENDENCY_NAME: &str = "dependency_name";
    const SCOPED_DEPENDENCY_NAME: &str = "@scope/dependency_name";
    const VERSION: &str = "1.4.0";
    const PRERELEASE_VERSION: &str = "1.4.0-prerelease.0";
    const COMMIT: &str = "188ed64efd5218beda276e02f2277bf3a6b745b2";

    fn assert_versions(keys: &[String], name: &str, version: &str) {
        for key in keys {
            let spec = parse_dependency_key(name, key)
                .unwrap_or_else(|| panic!("expected {key} to parse"));
            assert_eq!(spec.specifier_type(), DependencySpecifierType::Version, "{key}");
            assert_eq!(spec.package_name(), name, "{key}");
            assert_eq!(spec.version_specifier(), version, "{key}");
        }
    }

    fn key_forms(name: &str, version: &str) -> Vec<String> {
        vec![
            format!("path.pkgs.visualstudio.com/{name}/{version}"),
            format!("/{name}/{version}"),
            format!("/{name}/{version}/peer1@3.5.0+peer2@1.17.7"),
        ]
    }

    #[test]
    fn test_file_urls_are_not_parsed() {
        assert!(parse_dependency_key(DEPENDENCY_NAME, "file:///path/to/file").is_none());
    }

    #[test]
    fn test_link_references_are_not_parsed() {
        assert!(parse_dependency_key(DEPENDENCY_NAME, "link:../foo").is_none());
    }

    #[test]
    fn test_plain_versions() {
        assert_versions(&key_forms(DEPENDENCY_NAME, VERSION), DEPENDENCY_NAME, VERSION);
    }

    #[test]
    fn test_scoped_versions() {
        assert_versions(
            &key_forms(SCOPED_DEPENDENCY_NAME, VERSION),
            SCOPED_DEPENDENCY_NAME,
            VERSION,
        );
    }

    #[test]
    fn test_prerelease_versions_are_preserved() {
        assert_versions(
            &key_forms(DEPENDENCY_NAME, PRERELEASE_VERSION),
            DEPENDENCY_NAME,
            PRERELEASE_VERSION,
        );
        assert_versions(
            &key_forms(SCOPED_DEPENDENCY_NAME, PRERELEASE_VERSION),
            SCOPED_DEPENDENCY_NAME,
            PRERELEASE_VERSION,
        );
    }

    #[test]
    fn test_bare_versions() {
        assert_versions(
            &[
                "1.4.0".to_string(),
                "1.4.0_peer1@3.5.0".to_string(),
                "1.4.0(peer1@3.5.0)(peer2@1.17.7)".to_string(),
            ],
            DEPENDENCY_NAME,
            VERSION,
        );
    }

    #[test]
    fn test_v6_keys() {
        assert_versions(
            &[
                format!("/{SCOPED_DEPENDENCY_NAME}@{VERSION}"),
                format!("/{SCOPED_DEPENDENCY_NAME}@{VERSION}(@types/node@14.18.36)"),
            ],
            SCOPED_DEPENDENCY_NAME,
            VERSION,
        );
    }

    #[test]
    fn test_aliased_keys() {
        let spec =
            parse_dependency_key(SCOPED_DEPENDENCY_NAME, &format!("/{DEPENDENCY_NAME}/{VERSION}"))
                .unwrap();
        assert_eq!(spec.specifier_type(), DependencySpecifierType::Alias);
        assert_eq!(spec.package_name(), SCOPED_DEPENDENCY_NAME);
        assert_eq!(spec.version_specifier(), "npm:dependency_name@1.4.0");
        assert_eq!(spec.alias_target(), Some(("dependency_name", "1.4.0")));
    }

    #[test]
    fn test_source_references() {
        let keys = [
            format!("@github.com/abc/def/{COMMIT}"),
            format!("github.com/abc/def/{COMMIT}"),
            format!("github.com.au/abc/def/{COMMIT}"),
            format!("bitbucket.com/abc/def/{COMMIT}"),
            format!("bitbucket.com+abc/def/{COMMIT}"),
            format!("git@bitbucket.com+abc/def/{COMMIT}"),
            format!("bitbucket.co.in/abc/def/{COMMIT}"),
        ];

        for key in &keys {
            let spec = parse_dependency_key(SCOPED_DEPENDENCY_NAME, key)
                .unwrap_or_else(|| panic!("expected {key} to parse"));
            assert_eq!(spec.specifier_type(), DependencySpecifierType::Directory);
            assert_eq!(spec.package_name(), SCOPED_DEPENDENCY_NAME);
            assert_eq!(spec.version_specifier(), key.as_str());
        }
    }

    #[test]
    fn test_reparsing_the_version_specifier_is_stable() {
        let keys = [
            VERSION.to_string(),
            format!("/{DEPENDENCY_NAME}/{VERSION}_peer1@3.5.0"),
            format!("/{DEPENDENCY_NAME}@{VERSION}(peer1@3.5.0)"),
            format!("registry.npmjs.org/{DEPENDENCY_NAME}/{VERSION}"),
            format!("github.com/abc/def/{COMMIT}"),
            format!("git@bitbucket.com+abc/def/{COMMIT}"),
        ];

        for key in &keys {
            let spec = parse_dependency_key(DEPENDENCY_NAME, key).unwrap();
            let again = parse_dependency_key(DEPENDENCY_NAME, spec.version_specifier())
                .unwrap_or_else(|| panic!("{key} did not reparse"));
            assert!(spec.is_equivalent(&again), "{key}: {spec} vs {again}");
        }
    }

    #[test]
    fn test_garbage_is_not_parsed() {
        assert!(parse_dependency_key(DEPENDENCY_NAME, "").is_none());
        assert!(parse_dependency_key(DEPENDENCY_NAME, "latest").is_none());
        assert!(parse_dependency_key(DEPENDENCY_NAME, "/dependency_name/not-a-version").is_none());
    }

    #[test]
    fn test_declared_specifiers() {
        let cases = [
            ("1.4.0", DependencySpecifierType::Version, "1.4.0"),
            ("1.4.0-prerelease.0", DependencySpecifierType::Version, "1.4.0-prerelease.0"),
            ("^1.4.0", DependencySpecifierType::Range, "^1.4.0"),
            ("~1.4", DependencySpecifierType::Range, "~1.4"),
            ("*", DependencySpecifierType::Range, "*"),
            ("workspace:*", DependencySpecifierType::Workspace, "*"),
            ("workspace:^1.0.0", DependencySpecifierType::Workspace, "^1.0.0"),
            ("npm:other@1.0.0", DependencySpecifierType::Alias, "npm:other@1.0.0"),
            ("npm:@scope/other@^2", DependencySpecifierType::Alias, "npm:@scope/other@^2"),
            ("npm:@scope/other", DependencySpecifierType::Alias, "npm:@scope/other@*"),
            ("git+https://github.com/a/b.git", DependencySpecifierType::Directory, "git+https://github.com/a/b.git"),
            ("github:a/b#main", DependencySpecifierType::Directory, "github:a/b#main"),
            ("a/b", DependencySpecifierType::Directory, "a/b"),
            ("../local", DependencySpecifierType::Directory, "../local"),
            ("file:../local", DependencySpecifierType::Unsupported, "file:../local"),
            ("link:../local", DependencySpecifierType::Unsupported, "link:../local"),
            ("latest", DependencySpecifierType::Unsupported, "latest"),
        ];

        for (raw, expected_type, expected_version) in cases {
            let spec = DependencySpecifier::parse("pkg", raw);
            assert_eq!(spec.specifier_type(), expected_type, "{raw}");
            assert_eq!(spec.version_specifier(), expected_version, "{raw}");
            assert_eq!(spec.package_name(), "pkg");
        }
    }

    #[test]
    fn test_equivalence_ignores_name() {
        let declared = DependencySpecifier::parse("a", "1.0.0");
        let recorded = parse_dependency_key("b", "1.0.0").unwrap();
        assert!(declared.is_equivalent(&recorded));

        let range = DependencySpecifier::parse("a", "^1.0.0");
        assert!(!range.is_equivalent(&recorded));
    }

    #[test]
    fn test_split_resolution_key() {
        let parts = split_resolution_key("/@scope/name@1.0.0(react@18.2.0)").unwrap();
        assert_eq!(parts.name, "@scope/name");
        assert_eq!(parts.version, "1.0.0");
        assert_eq!(parts.peer_suffix, Some("(react@18.2.0)"));

        let parts = split_resolution_key("/name/2.0.0_react@18.2.0").unwrap();
        assert_eq!(parts.name, "name");
        assert_eq!(parts.version, "2.0.0");
        assert_eq!(parts.peer_suffix, Some("react@18.2.0"));

        assert!(split_resolution_key(&format!("github.com/abc/def/{COMMIT}")).is_none());
    }

    fn package_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z][a-z0-9-]{0,12}",
            "@[a-z][a-z0-9-]{0,8}/[a-z][a-z0-9-]{0,8}",
        ]
    }

    proptest! {
        #[test]
        fn prop_registry_keys_round_trip_version(
            name in package_name(),
            major in 0u32..100,
            minor in 0u32..100,
            patch in 0u32..100,
            v6 in any::<bool>(),
        ) {
            let version = format!("{major}.{minor}.{patch}");
            let key = if v6 {
                format!("/{name}@{version}(peer@1.0.0)")
            } else {
                format!("/{name}/{version}_peer@1.0.0")
            };

            let spec = parse_dependency_key(&name, &key).unwrap();
            prop_assert_eq!(spec.specifier_type(), DependencySpecifierType::Version);
            prop_assert_eq!(spec.version_specifier(), version.as_str());
        }

        #[test]
        fn prop_reparsing_is_stable(
            name in package_name(),
            major in 0u32..100,
            minor in 0u32..100,
            patch in 0u32..100,
            commit in "[a-f0-9]{7,40}",
            shape in 0usize..5,
        ) {
            let version = format!("{major}.{minor}.{patch}");
            let key = match shape {
                0 => version.clone(),
                1 => format!("/{name}/{version}_peer@1.0.0"),
                2 => format!("/{name}@{version}(peer@1.0.0)"),
                3 => format!("registry.npmjs.org/{name}/{version}"),
                _ => format!("github.com/abc/def/{commit}"),
            };

            let spec = parse_dependency_key(&name, &key).unwrap();
            prop_assert!(matches!(
                spec.specifier_type(),
                DependencySpecifierType::Version | DependencySpecifierType::Directory
            ));
            let again = parse_dependency_key(&name, spec.version_specifier()).unwrap();
            prop_assert!(spec.is_equivalent(&again));
        }

        #[test]
        fn prop_scheme_prefixed_strings_are_rejected(
            scheme in "[a-z]{1,8}",
            rest in "[ -~]{0,20}",
        ) {
            let raw = format!("{scheme}:{rest}");
            prop_assert!(parse_dependency_key("pkg", &raw).is_none());
        }

        #[test]
        fn prop_parsers_never_panic(raw in "\\PC{0,40}") {
            let _ = parse_dependency_key("pkg", &raw);
            let declared = DependencySpecifier::parse("pkg", &raw);
            prop_assert_eq!(declared.package_name(), "pkg");
        }
    }
}
