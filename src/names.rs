//! Folder name, file name and size helpers.
//!
//! Everything here is pure: no remote calls, no failure modes beyond the
//! boolean returned by [`is_valid_filename`].

use std::fmt;

use serde::Serialize;

/// Semantic category of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Code,
    Archive,
    /// Anything not in the table, including names without an extension.
    File,
}

impl FileKind {
    /// Lowercase name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Document => "document",
            FileKind::Code => "code",
            FileKind::Archive => "archive",
            FileKind::File => "file",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Extension table, searched in order. `ogg` appears under both video and
/// audio; the first match wins.
const EXTENSION_TABLE: &[(FileKind, &[&str])] = &[
    (
        FileKind::Image,
        &["jpg", "jpeg", "png", "gif", "svg", "webp", "bmp", "ico"],
    ),
    (FileKind::Video, &["mp4", "webm", "ogg", "mov", "avi"]),
    (FileKind::Audio, &["mp3", "wav", "ogg", "aac", "m4a"]),
    (
        FileKind::Document,
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md",
        ],
    ),
    (
        FileKind::Code,
        &[
            "js", "ts", "jsx", "tsx", "html", "css", "json", "xml", "yml", "yaml",
        ],
    ),
    (FileKind::Archive, &["zip", "rar", "7z", "tar", "gz"]),
];

/// Size units for [`format_size`].
const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Characters never allowed in an uploaded file name.
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Trim and replace every character outside `[A-Za-z0-9_-]` with `-`.
///
/// Case is preserved.
pub fn sanitize_folder_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Lowercased text after the final `.`, if there is one.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Classify a file name by its extension.
pub fn classify_extension(filename: &str) -> FileKind {
    let Some(ext) = file_extension(filename) else {
        return FileKind::File;
    };

    EXTENSION_TABLE
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(kind, _)| *kind)
        .unwrap_or(FileKind::File)
}

/// Human-readable byte size using base-1024 units.
///
/// `0` renders as `"0 Bytes"`; other values use the largest unit that keeps
/// the scaled value at or above 1, rounded to two decimals with trailing
/// zeros dropped.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / scale as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Whether `filename` can be stored as an object name.
pub fn is_valid_filename(filename: &str) -> bool {
    if filename.trim().is_empty() {
        return false;
    }
    !filename
        .chars()
        .any(|c| c.is_control() || ILLEGAL_FILENAME_CHARS.contains(&c))
}
