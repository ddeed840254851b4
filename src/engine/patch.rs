use std::path::Path;

use crate::content_hash;
use crate::error::EditorError;
use crate::line_store::{self, FileImage, LineRecord, Terminator};
use crate::path_guard;

/// A single patch targeting one file. `Range` is the wire shape exposed by
/// `patch_text_file_contents`/`insert_text_file_contents`/`delete_text_file_contents`;
/// `Append` is used by the `append_text_file_contents` sugar, which has no
/// line number to give and always targets end-of-file regardless of the
/// file's current length.
#[derive(Debug, Clone)]
pub enum Patch {
    Range {
        line_start: usize,
        line_end: Option<usize>,
        contents: String,
        range_hash: Option<String>,
    },
    Append {
        contents: String,
        range_hash: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub file_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Insert { at: usize },
    Replace { start: usize, end: usize },
}

struct Resolved {
    original_index: usize,
    kind: Kind,
    contents: String,
    range_hash: Option<String>,
}

impl Resolved {
    fn sort_start(&self) -> usize {
        match self.kind {
            Kind::Insert { at } => at,
            Kind::Replace { start, .. } => start,
        }
    }

    fn sort_end(&self) -> usize {
        match self.kind {
            Kind::Insert { at } => at.saturating_sub(1),
            Kind::Replace { end, .. } => end,
        }
    }
}

/// The central write operation. Pre-validates the whole request before any
/// I/O side effect, then applies every patch in one atomic commit.
pub fn run_patch(
    path: &Path,
    expected_file_hash: &str,
    patches: Vec<Patch>,
    encoding_name: &str,
) -> Result<PatchOutcome, EditorError> {
    let path_str = path.display().to_string();
    path_guard::validate_path(&path_str)?;

    let exists = line_store::exists(path);
    if !exists && !expected_file_hash.is_empty() {
        return Err(EditorError::FileNotFound {
            path: path_str,
            hint: Some("file does not exist; use create".to_string()),
        });
    }

    let image = if exists {
        line_store::load(path, encoding_name, Some("file does not exist; use create"))?
    } else {
        FileImage {
            lines: Vec::new(),
            content: String::new(),
            file_hash: content_hash::new_file_sentinel(),
        }
    };

    if !expected_file_hash.is_empty() && image.file_hash != expected_file_hash {
        return Err(EditorError::FileHashMismatch {
            path: path_str,
            current_hash: image.file_hash,
        });
    }

    if patches.is_empty() {
        return Err(EditorError::InvalidRequest {
            message: "patches must not be empty".to_string(),
        });
    }

    let total_lines = image.total_lines();
    let mut resolved = Vec::with_capacity(patches.len());
    for (index, patch) in patches.into_iter().enumerate() {
        resolved.push(classify(index, patch, total_lines, &path_str)?);
    }

    let mut order: Vec<usize> = (0..resolved.len()).collect();
    order.sort_by(|&a, &b| {
        resolved[a]
            .sort_start()
            .cmp(&resolved[b].sort_start())
            .then(resolved[a].sort_end().cmp(&resolved[b].sort_end()))
            .then(a.cmp(&b))
    });

    for window in order.windows(2) {
        let prev = &resolved[window[0]];
        let next = &resolved[window[1]];
        if overlaps(prev, next) {
            return Err(EditorError::OverlappingPatches {
                path: path_str,
                first_index: prev.original_index,
                first_start: prev.sort_start(),
                first_end: prev.sort_end(),
                second_index: next.original_index,
                second_start: next.sort_start(),
                second_end: next.sort_end(),
            });
        }
    }

    for patch in &resolved {
        if let Some(expected_range_hash) = &patch.range_hash {
            let (start, end) = match patch.kind {
                Kind::Replace { start, end } => (start, end),
                Kind::Insert { at } => (at, at.saturating_sub(1)),
            };
            let current_text = slice_text(&image.lines, start, end);
            let current_hash = content_hash::hash(&current_text);
            if &current_hash != expected_range_hash {
                return Err(EditorError::RangeHashMismatch {
                    path: path_str,
                    patch_index: patch.original_index,
                    current_hash,
                });
            }
        }
    }

    let dominant = image.dominant_terminator();
    let mut new_lines = image.lines.clone();
    for &index in order.iter().rev() {
        let patch = &resolved[index];
        let inserted = line_store::split_lines(&patch.contents);
        match patch.kind {
            Kind::Insert { at } => {
                let splice_at = at - 1;
                new_lines.splice(splice_at..splice_at, inserted);
            }
            Kind::Replace { start, end } => {
                new_lines.splice((start - 1)..end, inserted);
            }
        }
    }

    let last_index = new_lines.len().checked_sub(1);
    for (index, line) in new_lines.iter_mut().enumerate() {
        if Some(index) != last_index && line.terminator == Terminator::None {
            line.terminator = dominant;
        }
    }

    line_store::store(path, &new_lines, encoding_name)?;
    let new_content = line_store::join_lines(&new_lines);
    Ok(PatchOutcome {
        file_hash: content_hash::hash(&new_content),
    })
}

fn classify(
    original_index: usize,
    patch: Patch,
    total_lines: usize,
    path_str: &str,
) -> Result<Resolved, EditorError> {
    match patch {
        Patch::Append {
            contents,
            range_hash,
        } => Ok(Resolved {
            original_index,
            kind: Kind::Insert {
                at: total_lines + 1,
            },
            contents,
            range_hash,
        }),
        Patch::Range {
            line_start,
            line_end,
            contents,
            range_hash,
        } => {
            if line_start == 0 {
                return Err(EditorError::InvalidRange {
                    path: path_str.to_string(),
                    message: "line_start must be at least 1".to_string(),
                });
            }

            if total_lines == 0 {
                if line_start != 1 {
                    return Err(EditorError::InvalidRange {
                        path: path_str.to_string(),
                        message: format!(
                            "line_start ({line_start}) is invalid for an empty file; only 1 is valid"
                        ),
                    });
                }
                return Ok(Resolved {
                    original_index,
                    kind: Kind::Insert { at: 1 },
                    contents,
                    range_hash,
                });
            }

            if line_start == total_lines + 1 {
                return Ok(Resolved {
                    original_index,
                    kind: Kind::Insert {
                        at: total_lines + 1,
                    },
                    contents,
                    range_hash,
                });
            }

            match line_end {
                Some(end) if end + 1 == line_start => {
                    if line_start > total_lines + 1 {
                        return Err(EditorError::InvalidRange {
                            path: path_str.to_string(),
                            message: format!(
                                "line_start ({line_start}) is out of bounds for a file with {total_lines} lines"
                            ),
                        });
                    }
                    Ok(Resolved {
                        original_index,
                        kind: Kind::Insert { at: line_start },
                        contents,
                        range_hash,
                    })
                }
                Some(end) => {
                    if line_start > total_lines || end < line_start || end > total_lines {
                        return Err(EditorError::InvalidRange {
                            path: path_str.to_string(),
                            message: format!(
                                "range [{line_start}, {end}] is out of bounds for a file with {total_lines} lines"
                            ),
                        });
                    }
                    Ok(Resolved {
                        original_index,
                        kind: Kind::Replace {
                            start: line_start,
                            end,
                        },
                        contents,
                        range_hash,
                    })
                }
                None => {
                    if line_start > total_lines {
                        return Err(EditorError::InvalidRange {
                            path: path_str.to_string(),
                            message: format!(
                                "line_start ({line_start}) is out of bounds for a file with {total_lines} lines"
                            ),
                        });
                    }
                    Ok(Resolved {
                        original_index,
                        kind: Kind::Replace {
                            start: line_start,
                            end: total_lines,
                        },
                        contents,
                        range_hash,
                    })
                }
            }
        }
    }
}

fn overlaps(prev: &Resolved, next: &Resolved) -> bool {
    match (prev.kind, next.kind) {
        (Kind::Replace { end: e1, .. }, Kind::Replace { start: s2, .. }) => e1 >= s2,
        (Kind::Insert { .. }, Kind::Insert { .. }) => false,
        (Kind::Replace { start: s1, end: e1 }, Kind::Insert { at: k }) => k > s1 && k <= e1,
        (Kind::Insert { at: k }, Kind::Replace { start: s2, end: e2 }) => s2 < k && k <= e2,
    }
}

fn slice_text(lines: &[LineRecord], start: usize, end: usize) -> String {
    if start == 0 || end < start {
        return String::new();
    }
    lines[start - 1..end]
        .iter()
        .map(|line| line.rendered())
        .collect()
}

/// `insert`: exactly one of `after`/`before` must be given. `before = k`
/// inserts so the new content becomes lines starting at `k`; `after = k`
/// inserts immediately after current line `k` (`after = 0` means "before
/// line 1"). Funnels through [`run_patch`] as a single-patch insertion.
pub fn insert(
    path: &Path,
    expected_file_hash: &str,
    contents: String,
    after: Option<usize>,
    before: Option<usize>,
    encoding_name: &str,
) -> Result<PatchOutcome, EditorError> {
    let at = match (after, before) {
        (Some(_), Some(_)) => {
            return Err(EditorError::InvalidRequest {
                message: "exactly one of `after` or `before` may be given, not both".to_string(),
            });
        }
        (Some(after), None) => after + 1,
        (None, Some(before)) => before,
        (None, None) => {
            return Err(EditorError::InvalidRequest {
                message: "one of `after` or `before` must be given".to_string(),
            });
        }
    };

    let patches = vec![Patch::Range {
        line_start: at,
        line_end: Some(at.saturating_sub(1)),
        contents,
        range_hash: None,
    }];

    run_patch(path, expected_file_hash, patches, encoding_name)
}

/// One inclusive 1-based range to delete, with its conflict-detection hash.
#[derive(Debug, Clone)]
pub struct DeleteRange {
    pub line_start: usize,
    pub line_end: usize,
    pub range_hash: Option<String>,
}

/// `delete`: removes a list of inclusive ranges in one commit. Pre-validation
/// (hash match, non-empty list, non-overlapping, per-range hash) is identical
/// to [`run_patch`] because it *is* `run_patch` with empty replacement text.
pub fn delete(
    path: &Path,
    expected_file_hash: &str,
    ranges: Vec<DeleteRange>,
    encoding_name: &str,
) -> Result<PatchOutcome, EditorError> {
    if ranges.is_empty() {
        return Err(EditorError::InvalidRequest {
            message: "ranges must not be empty".to_string(),
        });
    }

    let patches = ranges
        .into_iter()
        .map(|range| Patch::Range {
            line_start: range.line_start,
            line_end: Some(range.line_end),
            contents: String::new(),
            range_hash: range.range_hash,
        })
        .collect();

    run_patch(path, expected_file_hash, patches, encoding_name)
}

/// `append`: appends `contents` to end-of-file, promoting a trailing
/// no-newline line to the dominant terminator first (handled uniformly by
/// [`run_patch`]'s terminator post-pass, not special-cased here).
pub fn append(
    path: &Path,
    expected_file_hash: &str,
    contents: String,
    encoding_name: &str,
) -> Result<PatchOutcome, EditorError> {
    let patches = vec![Patch::Append {
        contents,
        range_hash: None,
    }];
    run_patch(path, expected_file_hash, patches, encoding_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn patch_middle_replaces_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "a\nb\nc\n");
        let file_hash = content_hash::hash("a\nb\nc\n");
        let range_hash = content_hash::hash("b\n");

        let outcome = run_patch(
            &path,
            &file_hash,
            vec![Patch::Range {
                line_start: 2,
                line_end: Some(2),
                contents: "B\n".to_string(),
                range_hash: Some(range_hash),
            }],
            "utf-8",
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nB\nc\n");
        assert_eq!(outcome.file_hash, content_hash::hash("a\nB\nc\n"));
    }

    #[test]
    fn stale_file_hash_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "a\nb\nc\n");

        let error = run_patch(
            &path,
            &"0".repeat(64),
            vec![Patch::Range {
                line_start: 2,
                line_end: Some(2),
                contents: "B\n".to_string(),
                range_hash: Some(content_hash::hash("b\n")),
            }],
            "utf-8",
        )
        .unwrap_err();

        assert!(matches!(error, EditorError::FileHashMismatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn overlapping_replace_patches_are_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n4\n");
        let file_hash = content_hash::hash("1\n2\n3\n4\n");

        let error = run_patch(
            &path,
            &file_hash,
            vec![
                Patch::Range {
                    line_start: 1,
                    line_end: Some(2),
                    contents: "X\n".to_string(),
                    range_hash: Some(content_hash::hash("1\n2\n")),
                },
                Patch::Range {
                    line_start: 2,
                    line_end: Some(3),
                    contents: "Y\n".to_string(),
                    range_hash: Some(content_hash::hash("2\n3\n")),
                },
            ],
            "utf-8",
        )
        .unwrap_err();

        assert!(matches!(error, EditorError::OverlappingPatches { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n2\n3\n4\n");
    }

    #[test]
    fn stale_range_hash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "a\nb\nc\n");
        let file_hash = content_hash::hash("a\nb\nc\n");

        let error = run_patch(
            &path,
            &file_hash,
            vec![Patch::Range {
                line_start: 2,
                line_end: Some(2),
                contents: "B\n".to_string(),
                range_hash: Some(content_hash::hash("stale\n")),
            }],
            "utf-8",
        )
        .unwrap_err();

        assert!(matches!(error, EditorError::RangeHashMismatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn insert_before_boundary_of_replace_does_not_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n4\n");
        let file_hash = content_hash::hash("1\n2\n3\n4\n");

        let outcome = run_patch(
            &path,
            &file_hash,
            vec![
                Patch::Range {
                    line_start: 2,
                    line_end: Some(3),
                    contents: "X\nY\n".to_string(),
                    range_hash: Some(content_hash::hash("2\n3\n")),
                },
                Patch::Range {
                    line_start: 2,
                    line_end: Some(1),
                    contents: "Z\n".to_string(),
                    range_hash: None,
                },
            ],
            "utf-8",
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1\nZ\nX\nY\n4\n");
        let _ = outcome;
    }

    #[test]
    fn insert_strictly_inside_replace_range_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n4\n");
        let file_hash = content_hash::hash("1\n2\n3\n4\n");

        let error = run_patch(
            &path,
            &file_hash,
            vec![
                Patch::Range {
                    line_start: 2,
                    line_end: Some(3),
                    contents: "X\nY\n".to_string(),
                    range_hash: Some(content_hash::hash("2\n3\n")),
                },
                Patch::Range {
                    line_start: 3,
                    line_end: Some(2),
                    contents: "Z\n".to_string(),
                    range_hash: None,
                },
            ],
            "utf-8",
        )
        .unwrap_err();

        assert!(matches!(error, EditorError::OverlappingPatches { .. }));
    }

    #[test]
    fn append_to_file_without_trailing_newline_promotes_dominant_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "abc");
        let file_hash = content_hash::hash("abc");

        append(&path, &file_hash, "def".to_string(), "utf-8").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\ndef");
    }

    #[test]
    fn delete_all_lines_yields_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "a\nb\nc\n");
        let file_hash = content_hash::hash("a\nb\nc\n");

        let outcome = delete(
            &path,
            &file_hash,
            vec![DeleteRange {
                line_start: 1,
                line_end: 3,
                range_hash: Some(content_hash::hash("a\nb\nc\n")),
            }],
            "utf-8",
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(outcome.file_hash, content_hash::hash(""));
    }

    #[test]
    fn insert_after_total_lines_matches_insert_before_total_lines_plus_one() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = write(&dir, "a.txt", "1\n2\n3\n");
        let path_b = write(&dir, "b.txt", "1\n2\n3\n");
        let file_hash = content_hash::hash("1\n2\n3\n");

        insert(&path_a, &file_hash, "4\n".to_string(), Some(3), None, "utf-8").unwrap();
        insert(&path_b, &file_hash, "4\n".to_string(), None, Some(4), "utf-8").unwrap();

        assert_eq!(
            fs::read_to_string(&path_a).unwrap(),
            fs::read_to_string(&path_b).unwrap()
        );
    }

    #[test]
    fn empty_patch_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "a\n");
        let file_hash = content_hash::hash("a\n");

        let error = run_patch(&path, &file_hash, vec![], "utf-8").unwrap_err();
        assert!(matches!(error, EditorError::InvalidRequest { .. }));
    }

    #[test]
    fn missing_file_without_empty_hash_reports_not_found_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let error = run_patch(
            &path,
            &"0".repeat(64),
            vec![Patch::Append {
                contents: "x".to_string(),
                range_hash: None,
            }],
            "utf-8",
        )
        .unwrap_err();

        match error {
            EditorError::FileNotFound { hint, .. } => {
                assert_eq!(hint.as_deref(), Some("file does not exist; use create"))
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn insert_before_past_end_of_file_is_invalid_range_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n");
        let file_hash = content_hash::hash("1\n2\n3\n");

        let error = insert(&path, &file_hash, "x\n".to_string(), None, Some(100), "utf-8")
            .unwrap_err();

        assert!(matches!(error, EditorError::InvalidRange { .. }));
    }

    #[test]
    fn insert_after_past_end_of_file_is_invalid_range_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n");
        let file_hash = content_hash::hash("1\n2\n3\n");

        let error = insert(&path, &file_hash, "x\n".to_string(), Some(99), None, "utf-8")
            .unwrap_err();

        assert!(matches!(error, EditorError::InvalidRange { .. }));
    }

    #[test]
    fn patch_with_empty_range_far_past_end_of_file_is_invalid_range_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", "1\n2\n3\n");
        let file_hash = content_hash::hash("1\n2\n3\n");

        let error = run_patch(
            &path,
            &file_hash,
            vec![Patch::Range {
                line_start: 50,
                line_end: Some(49),
                contents: "x\n".to_string(),
                range_hash: None,
            }],
            "utf-8",
        )
        .unwrap_err();

        assert!(matches!(error, EditorError::InvalidRange { .. }));
    }
}
