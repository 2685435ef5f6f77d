//! Hosted folders and files.
//!
//! This module maps folder and file operations onto a path-addressed
//! content store:
//! - Folder listing, creation (marker object) and recursive deletion
//! - File listing, upload (create or overwrite) and deletion
//! - Sequential batch upload with per-file outcomes and progress

mod context;
mod service;
mod types;

pub use context::FolderContext;
pub use service::{filter_folders, ContentManager, MARKER_CONTENT};
pub use types::{
    CreatedFolder, FileEntry, FolderEntry, UploadFile, UploadOutcome, UploadProgress,
    UploadedFile,
};
