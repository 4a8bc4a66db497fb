use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Security-related errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Path must be relative to the workspace root: {0}")]
    AbsolutePath(PathBuf),

    #[error("Path escapes the workspace root: {0}")]
    PathEscapesWorkspace(PathBuf),

    #[error("Project name too long: {0} characters (max 214)")]
    NameTooLong(usize),

    #[error("Invalid project name '{0}': {1}")]
    InvalidName(String, &'static str),
}

/// Validate a workspace-relative path and normalize it lexically
///
/// Paths must:
/// - Be relative (no root, no drive prefix)
/// - Never climb above the workspace root with `..`
///
/// `.` components are dropped; an empty result means the root itself.
pub fn validate_project_path(path: &Path) -> Result<PathBuf, SecurityError> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(SecurityError::AbsolutePath(path.to_path_buf()));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(SecurityError::PathEscapesWorkspace(path.to_path_buf()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }

    Ok(normalized)
}

/// Validate a project name against npm package naming rules
///
/// Names must:
/// - Be 1-214 characters long
/// - Be lowercase, without spaces or control characters
/// - Not start with `.` or `_`
/// - Be `name` or `@scope/name`, each part URL-safe
pub fn validate_project_name(name: &str) -> Result<(), SecurityError> {
    let invalid = |reason| Err(SecurityError::InvalidName(name.to_string(), reason));

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name.len() > 214 {
        return Err(SecurityError::NameTooLong(name.len()));
    }
    if name.starts_with('.') || name.starts_with('_') {
        return invalid("name cannot start with '.' or '_'");
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return invalid("name must be lowercase");
    }

    let parts: Vec<&str> = match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, package)) => vec![scope, package],
            None => return invalid("scoped name must be '@scope/name'"),
        },
        None => vec![name],
    };

    for part in parts {
        if part.is_empty() {
            return invalid("name part is empty");
        }
        if !part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
        {
            return invalid("name contains characters that are not URL-safe");
        }
    }

    Ok(())
}
