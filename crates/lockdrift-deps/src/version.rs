//! Version shape checks used by the specifier parsers
//!
//! These only classify strings. Whether a version satisfies a range is never
//! evaluated: drift detection compares specifiers as strings.

/// Returns true when `raw` is exactly one semantic version.
///
/// Pre-release and build tags are accepted as-is (`1.4.0-prerelease.0`).
/// Loose forms such as `v1.2.3` or `1.2` are not exact versions.
pub fn is_exact_version(raw: &str) -> bool {
    semver::Version::parse(raw).is_ok()
}

/// Returns true when `raw` parses as an npm range (`^1.0.0`, `~2.3`, `1.x`,
/// `>=1 <2 || 3`, `*`).
pub fn is_version_range(raw: &str) -> bool {
    node_semver::Range::parse(raw).is_ok()
}

/// Split the install path of a resolution key into the version and the raw
/// peer annotation that follows it.
///
/// - `2.8.0/chai@3.5.0+sinon@1.17.7` -> (`2.8.0`, `chai@3.5.0+sinon@1.17.7`)
/// - `23.6.0_babel-core@6.26.3` -> (`23.6.0`, `babel-core@6.26.3`)
/// - `0.53.1(@types/node@14.18.36)` -> (`0.53.1`, `(@types/node@14.18.36)`)
/// - `1.4.0-prerelease.0` -> (`1.4.0-prerelease.0`, none)
pub fn split_install_path(install_path: &str) -> (&str, Option<&str>) {
    match install_path.find(['(', '/', '_']) {
        Some(idx) if idx > 0 => {
            let (version, rest) = install_path.split_at(idx);
            let annotation = rest.strip_prefix(['/', '_']).unwrap_or(rest);
            (version, (!annotation.is_empty()).then_some(annotation))
        }
        _ => (install_path, None),
    }
}
