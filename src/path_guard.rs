use std::path::{Component, Path};

use crate::error::EditorError;

/// Rejects paths that are not absolute or that contain a parent-directory
/// traversal segment after normalization, before any I/O is attempted.
pub fn validate_path(path: &str) -> Result<(), EditorError> {
    if path.is_empty() {
        return Err(EditorError::InvalidPath {
            path: path.to_string(),
            message: "path must not be empty".to_string(),
        });
    }

    let candidate = Path::new(path);
    if !candidate.is_absolute() {
        return Err(EditorError::InvalidPath {
            path: path.to_string(),
            message: "path must be absolute".to_string(),
        });
    }

    if candidate
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(EditorError::InvalidPath {
            path: path.to_string(),
            message: "path must not contain '..' segments".to_string(),
        });
    }

    Ok(())
}

/// Refuses to operate through a symlinked target so a write can't be
/// redirected outside the path the caller validated.
pub fn reject_symlink(path: &Path) -> Result<(), EditorError> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => Err(EditorError::InvalidPath {
            path: path.display().to_string(),
            message: "refusing to operate through a symbolic link".to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        assert!(validate_path("").is_err());
    }

    #[test]
    fn rejects_relative_path() {
        assert!(validate_path("foo/bar.txt").is_err());
    }

    #[test]
    fn rejects_traversal_segment() {
        assert!(validate_path("/a/../b.txt").is_err());
    }

    #[test]
    fn accepts_clean_absolute_path() {
        assert!(validate_path("/tmp/foo/bar.txt").is_ok());
    }

    #[test]
    fn reject_symlink_allows_missing_file() {
        let missing = Path::new("/tmp/lineguard-definitely-missing-xyz");
        assert!(reject_symlink(missing).is_ok());
    }
}
