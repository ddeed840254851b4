use std::collections::HashMap;
use std::path::Path;

use crate::content_hash;
use crate::error::EditorError;
use crate::line_store::{self, FileImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRead {
    pub content: String,
    pub line_start: usize,
    pub line_end: usize,
    pub file_hash: String,
    pub range_hash: String,
    pub total_lines: usize,
    pub content_size: usize,
}

/// Returns the exact on-disk substring (terminators included) covered by the
/// inclusive 1-based range `[line_start, line_end]`, clamped to the file's
/// bounds. `line_end = None` means "to end of file".
pub fn read_range(
    image: &FileImage,
    path: &str,
    line_start: usize,
    line_end: Option<usize>,
) -> Result<RangeRead, EditorError> {
    if let Some(end) = line_end {
        if end < line_start {
            return Err(EditorError::InvalidRange {
                path: path.to_string(),
                message: format!(
                    "line_end ({end}) must not be less than line_start ({line_start})"
                ),
            });
        }
    }

    let total = image.total_lines();
    if total == 0 {
        let content = String::new();
        let range_hash = content_hash::hash(&content);
        return Ok(RangeRead {
            content_size: content.chars().count(),
            content,
            line_start: 0,
            line_end: 0,
            file_hash: image.file_hash.clone(),
            range_hash,
            total_lines: 0,
        });
    }

    let clamped_start = line_start.clamp(1, total);
    let clamped_end = line_end.unwrap_or(total).min(total).max(clamped_start);

    let content = image.lines[clamped_start - 1..clamped_end]
        .iter()
        .map(|line| line.rendered())
        .collect::<String>();
    let range_hash = content_hash::hash(&content);

    Ok(RangeRead {
        content_size: content.chars().count(),
        content,
        line_start: clamped_start,
        line_end: clamped_end,
        file_hash: image.file_hash.clone(),
        range_hash,
        total_lines: total,
    })
}

#[derive(Debug, Clone)]
pub struct RangeRequest {
    pub path: String,
    pub encoding: String,
    pub ranges: Vec<(usize, Option<usize>)>,
}

#[derive(Debug, Clone)]
pub struct MultiFileRead {
    pub file_hash: String,
    pub ranges: Vec<RangeRead>,
}

/// Loads each requested file once and answers every range requested against
/// it. A missing/unreadable file yields a structured error for that path
/// only; other paths still succeed.
pub fn read_multi(
    requests: &[RangeRequest],
) -> HashMap<String, Result<MultiFileRead, EditorError>> {
    let mut results = HashMap::with_capacity(requests.len());

    for request in requests {
        let outcome = (|| -> Result<MultiFileRead, EditorError> {
            crate::path_guard::validate_path(&request.path)?;
            let path = Path::new(&request.path);
            let image = line_store::load(path, &request.encoding, None)?;

            let mut ranges = Vec::with_capacity(request.ranges.len());
            for (start, end) in &request.ranges {
                ranges.push(read_range(&image, &request.path, *start, *end)?);
            }

            Ok(MultiFileRead {
                file_hash: image.file_hash,
                ranges,
            })
        })();

        results.insert(request.path.clone(), outcome);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_store::split_lines;
    use std::fs;

    fn image_for(content: &str) -> FileImage {
        let lines = split_lines(content);
        FileImage {
            lines,
            content: content.to_string(),
            file_hash: content_hash::hash(content),
        }
    }

    #[test]
    fn read_range_returns_exact_line_with_terminator() {
        let image = image_for("a\nb\nc\n");
        let read = read_range(&image, "/a.txt", 2, Some(2)).unwrap();
        assert_eq!(read.content, "b\n");
        assert_eq!(read.line_start, 2);
        assert_eq!(read.line_end, 2);
        assert_eq!(read.total_lines, 3);
        assert_eq!(read.range_hash, content_hash::hash("b\n"));
    }

    #[test]
    fn read_range_without_end_reads_to_end_of_file() {
        let image = image_for("a\nb\nc\n");
        let read = read_range(&image, "/a.txt", 2, None).unwrap();
        assert_eq!(read.content, "b\nc\n");
        assert_eq!(read.line_end, 3);
    }

    #[test]
    fn read_range_clamps_end_beyond_total_lines() {
        let image = image_for("a\nb\n");
        let read = read_range(&image, "/a.txt", 1, Some(99)).unwrap();
        assert_eq!(read.line_end, 2);
        assert_eq!(read.content, "a\nb\n");
    }

    #[test]
    fn read_range_on_empty_file_yields_zeroed_range() {
        let image = image_for("");
        let read = read_range(&image, "/a.txt", 1, None).unwrap();
        assert_eq!(read.line_start, 0);
        assert_eq!(read.line_end, 0);
        assert_eq!(read.total_lines, 0);
        assert_eq!(read.content, "");
    }

    #[test]
    fn read_range_rejects_end_before_start() {
        let image = image_for("a\nb\nc\n");
        let error = read_range(&image, "/a.txt", 3, Some(1)).unwrap_err();
        assert!(matches!(error, EditorError::InvalidRange { .. }));
    }

    #[test]
    fn read_multi_shares_one_load_per_file_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good_path = dir.path().join("good.txt");
        fs::write(&good_path, "a\nb\nc\n").unwrap();
        let missing_path = dir.path().join("missing.txt");

        let requests = vec![
            RangeRequest {
                path: good_path.display().to_string(),
                encoding: "utf-8".to_string(),
                ranges: vec![(1, Some(1)), (2, None)],
            },
            RangeRequest {
                path: missing_path.display().to_string(),
                encoding: "utf-8".to_string(),
                ranges: vec![(1, None)],
            },
        ];

        let results = read_multi(&requests);
        let good = results
            .get(&good_path.display().to_string())
            .unwrap()
            .as_ref()
            .unwrap();
        assert_eq!(good.ranges.len(), 2);
        assert_eq!(good.ranges[0].content, "a\n");
        assert_eq!(good.ranges[1].content, "b\nc\n");

        let missing = results.get(&missing_path.display().to_string()).unwrap();
        assert!(missing.is_err());
    }
}
