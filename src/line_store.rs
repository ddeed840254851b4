use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;

use crate::content_hash;
use crate::encoding;
use crate::error::EditorError;
use crate::path_guard;

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Lf,
    CrLf,
    Cr,
    None,
}

impl Terminator {
    pub fn as_str(self) -> &'static str {
        match self {
            Terminator::Lf => "\n",
            Terminator::CrLf => "\r\n",
            Terminator::Cr => "\r",
            Terminator::None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub text: String,
    pub terminator: Terminator,
}

impl LineRecord {
    pub fn rendered(&self) -> String {
        let mut out = self.text.clone();
        out.push_str(self.terminator.as_str());
        out
    }
}

#[derive(Debug, Clone)]
pub struct FileImage {
    pub lines: Vec<LineRecord>,
    pub content: String,
    pub file_hash: String,
}

impl FileImage {
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// The dominant terminator: most frequent in the file, ties broken
    /// LF > CRLF > CR, empty file defaults to LF.
    pub fn dominant_terminator(&self) -> Terminator {
        dominant_terminator(&self.lines)
    }
}

pub fn dominant_terminator(lines: &[LineRecord]) -> Terminator {
    let mut lf = 0usize;
    let mut crlf = 0usize;
    let mut cr = 0usize;
    for line in lines {
        match line.terminator {
            Terminator::Lf => lf += 1,
            Terminator::CrLf => crlf += 1,
            Terminator::Cr => cr += 1,
            Terminator::None => {}
        }
    }
    if lf == 0 && crlf == 0 && cr == 0 {
        return Terminator::Lf;
    }
    if lf >= crlf && lf >= cr {
        Terminator::Lf
    } else if crlf >= cr {
        Terminator::CrLf
    } else {
        Terminator::Cr
    }
}

/// Splits `content` into line records, preserving each line's terminator
/// exactly as it appeared. A file whose bytes do not end with a terminator
/// carries exactly one trailing `Terminator::None` record; an empty file
/// yields zero records.
pub fn split_lines(content: &str) -> Vec<LineRecord> {
    if content.is_empty() {
        return Vec::new();
    }

    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(LineRecord {
                    text: content[start..index].to_string(),
                    terminator: Terminator::Lf,
                });
                index += 1;
                start = index;
            }
            b'\r' => {
                if index + 1 < bytes.len() && bytes[index + 1] == b'\n' {
                    lines.push(LineRecord {
                        text: content[start..index].to_string(),
                        terminator: Terminator::CrLf,
                    });
                    index += 2;
                } else {
                    lines.push(LineRecord {
                        text: content[start..index].to_string(),
                        terminator: Terminator::Cr,
                    });
                    index += 1;
                }
                start = index;
            }
            _ => index += 1,
        }
    }

    if start < content.len() {
        lines.push(LineRecord {
            text: content[start..].to_string(),
            terminator: Terminator::None,
        });
    }

    lines
}

pub fn join_lines(lines: &[LineRecord]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.rendered());
    }
    out
}

/// Loads `path` and decodes it under `encoding_name`. A missing file is
/// reported as [`EditorError::FileNotFound`]; `hint` lets the caller attach
/// the operation-specific "use create" / "use append" guidance.
pub fn load(path: &Path, encoding_name: &str, hint: Option<&str>) -> Result<FileImage, EditorError> {
    let display_path = path.display().to_string();
    path_guard::reject_symlink(path)?;

    let bytes = fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => EditorError::FileNotFound {
            path: display_path.clone(),
            hint: hint.map(str::to_string),
        },
        _ => EditorError::io(&display_path, source),
    })?;

    let content = encoding::decode(&bytes, encoding_name, &display_path)?;
    let lines = split_lines(&content);
    let file_hash = content_hash::hash(&content);

    Ok(FileImage {
        lines,
        content,
        file_hash,
    })
}

pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Encodes `lines` and persists them atomically: write to a sibling temp
/// file, `fsync`, rename over the target, `fsync` the parent directory.
/// On any failure between write and rename the original file is untouched.
pub fn store(path: &Path, lines: &[LineRecord], encoding_name: &str) -> Result<(), EditorError> {
    let display_path = path.display().to_string();
    let content = join_lines(lines);
    let bytes = encoding::encode(&content, encoding_name, &display_path)?;
    write_bytes_atomically(path, &bytes)
}

/// Creates any missing parent directories, refusing to disturb an existing
/// target file. Used only by `create`.
pub fn ensure_parent_dirs(path: &Path) -> Result<(), EditorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| EditorError::DirectoryError {
                path: parent.display().to_string(),
                message: source.to_string(),
            })?;
        }
    }
    Ok(())
}

fn write_bytes_atomically(path: &Path, bytes: &[u8]) -> Result<(), EditorError> {
    let display_path = path.display().to_string();
    let target_permissions = fs::metadata(path).ok().map(|metadata| metadata.permissions());
    let (temp_path, mut temp_file) = create_temp_file_adjacent(path)?;

    let result = (|| -> Result<(), EditorError> {
        temp_file
            .write_all(bytes)
            .map_err(|source| EditorError::io(&display_path, source))?;
        temp_file
            .sync_all()
            .map_err(|source| EditorError::io(&display_path, source))?;

        if let Some(permissions) = &target_permissions {
            fs::set_permissions(&temp_path, permissions.clone())
                .map_err(|source| EditorError::io(&display_path, source))?;
        }
        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|source| EditorError::io(&display_path, source))?;
        sync_parent_directory(path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn create_temp_file_adjacent(path: &Path) -> Result<(PathBuf, File), EditorError> {
    let parent = resolve_parent_directory(path);
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("lineguard-target");

    for _ in 0..64 {
        let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        let temp_name = format!(".{file_name}.lineguard-tmp-{nanos}-{counter}");
        let temp_path = parent.join(temp_name);

        match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((temp_path, file)),
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(error) => return Err(EditorError::io(&temp_path.display().to_string(), error)),
        }
    }

    Err(EditorError::InvalidRequest {
        message: format!(
            "failed to allocate an adjacent temporary file for '{}'",
            path.display()
        ),
    })
}

fn resolve_parent_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sync_parent_directory(path: &Path) -> Result<(), EditorError> {
    #[cfg(unix)]
    {
        let parent = resolve_parent_directory(path);
        let directory_handle =
            File::open(&parent).map_err(|source| EditorError::io(&parent.display().to_string(), source))?;
        directory_handle
            .sync_all()
            .map_err(|source| EditorError::io(&parent.display().to_string(), source))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

/// Advisory cross-process lock used only to serialize concurrent writers
/// against the *same* temp-file-allocation race, not as a substitute for the
/// hash-based optimistic concurrency control the engine relies on.
#[allow(dead_code)]
pub(crate) fn try_lock_exclusive(file: &File) -> std::io::Result<()> {
    file.try_lock_exclusive()
}
