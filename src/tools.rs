//! MCP tool argument/result shapes and their dispatch into [`crate::engine`].
//!
//! Every input struct derives `schemars::JsonSchema` so [`crate::server`] can
//! publish its input schema via `tools/list` without hand-written JSON.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::encoding::DEFAULT_ENCODING;
use crate::engine::{self, DeleteRange, Patch};
use crate::error::EditorError;

fn encoding_or_default(encoding: Option<String>) -> String {
    encoding.unwrap_or_else(|| DEFAULT_ENCODING.to_string())
}

fn error_value(error: &EditorError) -> serde_json::Value {
    serde_json::to_value(error.to_error_response()).unwrap_or_else(|_| {
        serde_json::json!({
            "result": "error",
            "reason": "internal_error: failed to serialize error response",
        })
    })
}

#[derive(Debug, Serialize)]
struct WriteOutput {
    result: &'static str,
    file_hash: String,
}

fn write_success(outcome: engine::PatchOutcome) -> serde_json::Value {
    serde_json::to_value(WriteOutput {
        result: "ok",
        file_hash: outcome.file_hash,
    })
    .unwrap_or_else(|_| serde_json::json!({"result": "ok"}))
}

// ── get_text_file_contents ──────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileRangeSpec {
    pub line_start: usize,
    pub line_end: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileReadSpec {
    pub file_path: String,
    pub ranges: Vec<FileRangeSpec>,
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTextFileContentsInput {
    pub files: Vec<FileReadSpec>,
}

pub fn get_text_file_contents(input: GetTextFileContentsInput) -> serde_json::Value {
    let requests: Vec<engine::RangeRequest> = input
        .files
        .iter()
        .map(|file| engine::RangeRequest {
            path: file.file_path.clone(),
            encoding: encoding_or_default(file.encoding.clone()),
            ranges: file
                .ranges
                .iter()
                .map(|range| (range.line_start, range.line_end))
                .collect(),
        })
        .collect();

    let mut results = engine::read_multi(&requests);
    let mut map = serde_json::Map::with_capacity(input.files.len());

    for file in &input.files {
        let value = match results.remove(&file.file_path) {
            Some(Ok(read)) => serde_json::json!({
                "file_hash": read.file_hash,
                "ranges": read.ranges.iter().map(|range| serde_json::json!({
                    "content": range.content,
                    "line_start": range.line_start,
                    "line_end": range.line_end,
                    "range_hash": range.range_hash,
                    "total_lines": range.total_lines,
                    "content_size": range.content_size,
                })).collect::<Vec<_>>(),
            }),
            Some(Err(error)) => error_value(&error),
            None => error_value(&EditorError::InvalidRequest {
                message: format!("no result produced for '{}'", file.file_path),
            }),
        };
        map.insert(file.file_path.clone(), value);
    }

    serde_json::Value::Object(map)
}

// ── create_text_file ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTextFileInput {
    pub file_path: String,
    pub contents: String,
    pub encoding: Option<String>,
}

pub fn create_text_file(input: CreateTextFileInput) -> serde_json::Value {
    let encoding_name = encoding_or_default(input.encoding);
    let path = Path::new(&input.file_path);
    match engine::create(path, &input.contents, &encoding_name) {
        Ok(outcome) => write_success(outcome),
        Err(error) => error_value(&error),
    }
}

// ── append_text_file_contents ───────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AppendTextFileContentsInput {
    pub file_path: String,
    pub file_hash: String,
    pub contents: String,
    pub encoding: Option<String>,
}

pub fn append_text_file_contents(input: AppendTextFileContentsInput) -> serde_json::Value {
    let encoding_name = encoding_or_default(input.encoding);
    let path = Path::new(&input.file_path);
    match engine::append(path, &input.file_hash, input.contents, &encoding_name) {
        Ok(outcome) => write_success(outcome),
        Err(error) => error_value(&error),
    }
}

// ── insert_text_file_contents ───────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InsertTextFileContentsInput {
    pub file_path: String,
    pub file_hash: String,
    pub contents: String,
    pub after: Option<usize>,
    pub before: Option<usize>,
    pub encoding: Option<String>,
}

pub fn insert_text_file_contents(input: InsertTextFileContentsInput) -> serde_json::Value {
    let encoding_name = encoding_or_default(input.encoding);
    let path = Path::new(&input.file_path);
    match engine::insert(
        path,
        &input.file_hash,
        input.contents,
        input.after,
        input.before,
        &encoding_name,
    ) {
        Ok(outcome) => write_success(outcome),
        Err(error) => error_value(&error),
    }
}

// ── delete_text_file_contents ───────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteRangeInput {
    pub line_start: usize,
    pub line_end: usize,
    pub range_hash: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteTextFileContentsInput {
    pub file_path: String,
    pub file_hash: String,
    pub ranges: Vec<DeleteRangeInput>,
    pub encoding: Option<String>,
}

pub fn delete_text_file_contents(input: DeleteTextFileContentsInput) -> serde_json::Value {
    let encoding_name = encoding_or_default(input.encoding);
    let path = Path::new(&input.file_path);
    let ranges = input
        .ranges
        .into_iter()
        .map(|range| DeleteRange {
            line_start: range.line_start,
            line_end: range.line_end,
            range_hash: range.range_hash,
        })
        .collect();

    match engine::delete(path, &input.file_hash, ranges, &encoding_name) {
        Ok(outcome) => write_success(outcome),
        Err(error) => error_value(&error),
    }
}

// ── patch_text_file_contents ────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchSpecInput {
    pub line_start: usize,
    pub line_end: Option<usize>,
    pub contents: String,
    pub range_hash: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchTextFileContentsInput {
    pub file_path: String,
    pub file_hash: String,
    pub patches: Vec<PatchSpecInput>,
    pub encoding: Option<String>,
}

pub fn patch_text_file_contents(input: PatchTextFileContentsInput) -> serde_json::Value {
    let encoding_name = encoding_or_default(input.encoding);
    let path = Path::new(&input.file_path);
    let patches: Vec<Patch> = input
        .patches
        .into_iter()
        .map(|patch| Patch::Range {
            line_start: patch.line_start,
            line_end: patch.line_end,
            contents: patch.contents,
            range_hash: patch.range_hash,
        })
        .collect();

    match engine::run_patch(path, &input.file_hash, patches, &encoding_name) {
        Ok(outcome) => write_success(outcome),
        Err(error) => error_value(&error),
    }
}
