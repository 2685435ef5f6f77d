//! Path-addressed content store.
//!
//! The store holds objects keyed by slash-separated paths on one branch of a
//! repository. Directories exist only as path prefixes. Every object carries
//! a version token (its blob sha); writes and deletes against an existing
//! object must present the current token or fail with a conflict.

mod github;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::Result;

pub use github::GitHubStore;
pub use memory::MemoryStore;

/// Kind of an entry in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a contents listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentItem {
    /// Last path segment.
    pub name: String,
    /// Full path from the repository root.
    pub path: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Version token.
    pub sha: String,
    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,
    /// Raw download URL (files only).
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Result of a successful create-or-update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// Version token of the object as written.
    pub version_token: String,
}

/// Read, create-or-update and delete objects by path.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List a directory, or return a file as a one-element listing.
    ///
    /// Fails with `NotFound` when nothing exists at `path`.
    async fn get_contents(&self, path: &str) -> Result<Vec<ContentItem>>;

    /// Create (no token) or overwrite (current token) the object at `path`.
    ///
    /// `content` is base64. A missing or stale token on an existing object
    /// fails with `Conflict`.
    async fn put_object(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<PutResult>;

    /// Delete the object at `path`, which must still have `version_token`.
    async fn delete_object(&self, path: &str, version_token: &str, message: &str) -> Result<()>;

    /// Metadata of the object at exactly `path`, or `None` if absent.
    async fn find_object(&self, path: &str) -> Result<Option<ContentItem>> {
        match self.get_contents(path).await {
            Ok(items) => Ok(items.into_iter().find(|item| item.path == path)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn get_contents(&self, path: &str) -> Result<Vec<ContentItem>> {
        (**self).get_contents(path).await
    }

    async fn put_object(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<PutResult> {
        (**self)
            .put_object(path, content, message, version_token)
            .await
    }

    async fn delete_object(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        (**self).delete_object(path, version_token, message).await
    }

    async fn find_object(&self, path: &str) -> Result<Option<ContentItem>> {
        (**self).find_object(path).await
    }
}
