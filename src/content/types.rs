//! Records returned by the content manager.

use std::path::Path;

use serde::Serialize;

use crate::names::FileKind;
use crate::{GitDropError, Result};

/// A hosted file, as seen when its folder was listed.
///
/// This is a snapshot: the version token goes stale as soon as anyone else
/// writes the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub version_token: String,
    pub size_bytes: u64,
    /// Public URL the file is served from.
    pub public_url: String,
    /// Raw download URL reported by the store.
    pub download_url: String,
    pub kind: FileKind,
}

/// A folder under the base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub version_token: String,
}

/// A folder just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedFolder {
    /// Sanitized name the folder was stored under.
    pub name: String,
    pub path: String,
    /// Version token of the marker object.
    pub marker_version_token: String,
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Object name inside the target folder.
    pub name: String,
    /// Raw bytes.
    pub content: Vec<u8>,
}

impl UploadFile {
    /// Create an upload from in-memory content.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Read a local file; the upload keeps its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                GitDropError::Validation(format!("{} has no usable file name", path.display()))
            })?
            .to_string();
        let content = tokio::fs::read(path).await?;
        Ok(Self { name, content })
    }
}

/// A file written by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    /// Version token of the object as written.
    pub version_token: String,
}

/// Outcome of one file in a batch upload.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Name of the file attempted.
    pub file: String,
    pub result: Result<UploadedFile>,
}

impl UploadOutcome {
    /// Whether the file was written.
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// Error message, if the upload failed.
    pub fn error(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| e.to_string())
    }
}

/// Progress of a batch upload, reported after every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    /// Attempts finished so far (1-based).
    pub current: usize,
    pub total: usize,
    /// `current / total` as a rounded percentage.
    pub percentage: u8,
    /// Name of the file just attempted.
    pub current_file: String,
}

impl UploadProgress {
    pub(crate) fn new(current: usize, total: usize, current_file: &str) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((current as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            current,
            total,
            percentage,
            current_file: current_file.to_string(),
        }
    }
}
