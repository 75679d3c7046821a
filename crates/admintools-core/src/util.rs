//! Path helpers shared by the upload pipeline

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors related to untrusted path input
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Path escapes install root: {0}")]
    EscapesRoot(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),
}

/// Join an archive entry path onto a root directory.
///
/// Entry names come from an uploaded archive, so `..` segments that climb
/// above the root, absolute paths and NUL bytes are all rejected.
///
/// # Errors
/// Returns an error if the entry would land outside `root`
pub fn safe_join(root: &Path, entry_path: &Path) -> Result<PathBuf, PathError> {
    let normalized = normalize_path(entry_path)?;
    if normalized.as_os_str().is_empty() {
        return Err(PathError::InvalidComponent(format!(
            "Empty entry path: {}",
            entry_path.display()
        )));
    }

    let joined = root.join(&normalized);
    verify_under_root(root, &joined)?;

    Ok(joined)
}

fn normalize_path(path: &Path) -> Result<PathBuf, PathError> {
    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                if c.to_string_lossy().contains('\0') {
                    return Err(PathError::InvalidComponent(
                        "Null byte in path".to_string(),
                    ));
                }
                normalized.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::TraversalAttempt(path.display().to_string()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::InvalidComponent(
                    "Absolute path not allowed".to_string(),
                ));
            }
        }
    }

    Ok(normalized)
}

fn verify_under_root(root: &Path, path: &Path) -> Result<(), PathError> {
    // Canonicalize only when both sides exist; new files are checked logically.
    if root.exists() && path.exists() {
        let canonical_root = root
            .canonicalize()
            .map_err(|_| PathError::EscapesRoot(path.display().to_string()))?;
        let canonical_path = path
            .canonicalize()
            .map_err(|_| PathError::EscapesRoot(path.display().to_string()))?;

        if !canonical_path.starts_with(&canonical_root) {
            return Err(PathError::EscapesRoot(path.display().to_string()));
        }
    } else if !path.starts_with(root) {
        return Err(PathError::EscapesRoot(path.display().to_string()));
    }

    Ok(())
}

/// Validate a run identifier for use as a single directory name
///
/// # Errors
/// Returns an error if the identifier is empty or could address another directory
pub fn validate_run_id(run_id: &str) -> Result<(), PathError> {
    if run_id.is_empty() {
        return Err(PathError::InvalidComponent("Empty run id".to_string()));
    }

    if run_id.contains('/') || run_id.contains('\\') {
        return Err(PathError::TraversalAttempt(format!(
            "Run id contains path separator: {run_id}"
        )));
    }

    if run_id.contains("..") {
        return Err(PathError::TraversalAttempt(format!(
            "Run id contains parent directory reference: {run_id}"
        )));
    }

    if run_id.starts_with('.') || run_id.contains('\0') {
        return Err(PathError::InvalidComponent(format!(
            "Run id is not a plain name: {run_id}"
        )));
    }

    Ok(())
}

/// File name of a path as an owned string, empty when there is none
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
