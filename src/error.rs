use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// The closed set of failure modes the edit engine can report.
///
/// Every variant maps to exactly one wire error kind via [`EditorError::to_error_response`];
/// adding a new failure mode means adding both a variant and a response mapping.
#[derive(Debug, Error, Diagnostic)]
pub enum EditorError {
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Invalid range for '{path}': {message}")]
    InvalidRange { path: String, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("File not found: '{path}'")]
    FileNotFound { path: String, hint: Option<String> },

    #[error("File already exists: '{path}'")]
    AlreadyExists { path: String },

    #[error("Permission denied for '{path}'")]
    PermissionDenied { path: String },

    #[error("Failed to create parent directory for '{path}': {message}")]
    DirectoryError { path: String, message: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding error on '{path}' at byte offset {offset}: {message}")]
    EncodingError {
        path: String,
        offset: usize,
        message: String,
    },

    #[error("File hash mismatch for '{path}'")]
    FileHashMismatch { path: String, current_hash: String },

    #[error("Range hash mismatch for '{path}' at patch #{patch_index}")]
    RangeHashMismatch {
        path: String,
        patch_index: usize,
        current_hash: String,
    },

    #[error(
        "Overlapping patches in '{path}': patch #{first_index} [{first_start}, {first_end}] overlaps patch #{second_index} [{second_start}, {second_end}]"
    )]
    OverlappingPatches {
        path: String,
        first_index: usize,
        first_start: usize,
        first_end: usize,
        second_index: usize,
        second_start: usize,
        second_end: usize,
    },
}

impl EditorError {
    pub fn io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_string(),
                hint: None,
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_string(),
            },
            _ => Self::Io {
                path: path.to_string(),
                source,
            },
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (reason, file_hash, suggestion, hint) = match self {
            Self::InvalidPath { .. } => ("invalid_path", None, None, None),
            Self::InvalidRange { .. } => ("invalid_range", None, None, None),
            Self::InvalidRequest { .. } => ("invalid_request", None, None, None),
            Self::FileNotFound { hint, .. } => (
                "file_not_found",
                None,
                Some("use `create_text_file`".to_string()),
                hint.clone(),
            ),
            Self::AlreadyExists { .. } => (
                "already_exists",
                None,
                Some("use `patch_text_file_contents` or `append_text_file_contents`".to_string()),
                None,
            ),
            Self::PermissionDenied { .. } => ("permission_denied", None, None, None),
            Self::DirectoryError { .. } => ("directory_error", None, None, None),
            Self::Io { .. } => ("io_error", None, None, None),
            Self::EncodingError { .. } => ("encoding_error", None, None, None),
            Self::FileHashMismatch { current_hash, .. } => (
                "file_hash_mismatch",
                Some(current_hash.clone()),
                Some("re-read the file and retry with the current file_hash".to_string()),
                None,
            ),
            Self::RangeHashMismatch { current_hash, .. } => (
                "range_hash_mismatch",
                Some(current_hash.clone()),
                Some("re-read the affected range and retry".to_string()),
                None,
            ),
            Self::OverlappingPatches { .. } => ("overlapping_patches", None, None, None),
        };

        ErrorResponse {
            result: "error",
            reason: format!("{reason}: {self}"),
            file_hash,
            suggestion,
            hint,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub result: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
