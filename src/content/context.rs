//! The folder a caller is working in.

use crate::names::sanitize_folder_name;

/// Current folder for file operations.
///
/// Each caller owns its own context and passes it to the file operations,
/// so two concurrent operations cannot change each other's target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderContext {
    default_folder: String,
    current: String,
}

impl FolderContext {
    /// Start in `default_folder`.
    pub fn new(default_folder: impl Into<String>) -> Self {
        let default_folder = default_folder.into();
        Self {
            current: default_folder.clone(),
            default_folder,
        }
    }

    /// Switch folders. An empty name selects the default folder.
    pub fn select(&mut self, folder: &str) {
        let folder = sanitize_folder_name(folder);
        self.current = if folder.is_empty() {
            self.default_folder.clone()
        } else {
            folder
        };
    }

    /// Name of the current folder.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Name of the default folder.
    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    /// Return to the default folder (on session end).
    pub fn reset(&mut self) {
        self.current = self.default_folder.clone();
    }
}
