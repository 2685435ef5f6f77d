//! GitDrop - File hosting on top of a repository's contents API.
//!
//! Folders are path prefixes inside one branch of a repository, files are
//! objects under them, and every write is guarded by the object's version
//! token.

pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod names;
pub mod session;
pub mod store;

pub use config::Config;
pub use content::{
    filter_folders, ContentManager, CreatedFolder, FileEntry, FolderContext, FolderEntry,
    UploadFile, UploadOutcome, UploadProgress, UploadedFile,
};
pub use error::{GitDropError, Result};
pub use names::{classify_extension, format_size, sanitize_folder_name, FileKind};
pub use session::{Credential, Identity, Session, SessionProvider, SessionStore};
pub use store::{ContentItem, ContentStore, GitHubStore, ItemKind, MemoryStore, PutResult};
