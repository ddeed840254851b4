use std::path::Path;

use crate::content_hash;
use crate::error::EditorError;
use crate::line_store;
use crate::path_guard;

use super::patch::PatchOutcome;

/// Creates a brand-new file. Refuses to overwrite an existing path (even an
/// empty one) with [`EditorError::AlreadyExists`] — unlike `run_patch`,
/// which treats "no file yet, empty `expected_file_hash`" as license to
/// create, `create` is the only entry point that must never touch an
/// existing file regardless of hash.
pub fn create(path: &Path, contents: &str, encoding_name: &str) -> Result<PatchOutcome, EditorError> {
    let path_str = path.display().to_string();
    path_guard::validate_path(&path_str)?;

    if line_store::exists(path) {
        return Err(EditorError::AlreadyExists { path: path_str });
    }

    line_store::ensure_parent_dirs(path)?;
    let lines = line_store::split_lines(contents);
    line_store::store(path, &lines, encoding_name)?;

    Ok(PatchOutcome {
        file_hash: content_hash::hash(contents),
    })
}
