//! Folder and file operations on top of a content store.
//!
//! Folders are path prefixes under the configured base path, kept alive by
//! a marker object. None of the multi-step operations here are atomic: the
//! store only offers a per-object version check on the write itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, error, info, warn};

use super::context::FolderContext;
use super::types::{
    CreatedFolder, FileEntry, FolderEntry, UploadFile, UploadOutcome, UploadProgress,
    UploadedFile,
};
use crate::config::StorageConfig;
use crate::names::{classify_extension, is_valid_filename, sanitize_folder_name};
use crate::store::{ContentStore, ItemKind, PutResult};
use crate::{GitDropError, Result};

/// Content of a folder marker. Some backends mishandle empty blobs.
pub const MARKER_CONTENT: &[u8] = b"\n";

/// Folder and file manager.
pub struct ContentManager<S> {
    store: S,
    storage: StorageConfig,
}

impl<S: ContentStore> ContentManager<S> {
    /// Create a manager over `store`.
    pub fn new(store: S, storage: StorageConfig) -> Self {
        Self { store, storage }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Storage layout in use.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// A context starting in the configured default folder.
    pub fn new_context(&self) -> FolderContext {
        FolderContext::new(self.storage.default_folder.clone())
    }

    fn base_path(&self) -> &str {
        self.storage.file_base_path.trim_matches('/')
    }

    fn folder_path(&self, folder: &str) -> String {
        format!("{}/{}", self.base_path(), folder)
    }

    fn file_path(&self, folder: &str, name: &str) -> String {
        format!("{}/{}/{}", self.base_path(), folder, name)
    }

    /// Public URL of `name` in `folder`.
    pub fn public_url(&self, folder: &str, name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.storage.public_base_url.trim_end_matches('/'),
            self.base_path(),
            folder,
            name
        )
    }

    /// Public URL of `name` in the context's current folder.
    pub fn file_url(&self, ctx: &FolderContext, name: &str) -> String {
        self.public_url(ctx.current(), name)
    }

    /// List folders, ordered by name ignoring case.
    ///
    /// A missing base path means no folders yet.
    pub async fn list_folders(&self) -> Result<Vec<FolderEntry>> {
        let items = match self.store.get_contents(self.base_path()).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.context("failed to list folders")),
        };

        let mut folders: Vec<FolderEntry> = items
            .into_iter()
            .filter(|item| item.kind == ItemKind::Dir)
            .map(|item| FolderEntry {
                name: item.name,
                path: item.path,
                version_token: item.sha,
            })
            .collect();
        folders.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(folders)
    }

    /// Whether a folder named `name` exists, ignoring case.
    ///
    /// Answered from the folder listing, never from a direct probe.
    pub async fn folder_exists(&self, name: &str) -> Result<bool> {
        let folders = self.list_folders().await?;
        Ok(folders.iter().any(|f| f.name.eq_ignore_ascii_case(name)))
    }

    /// Create a folder by writing its marker object.
    ///
    /// The name is sanitized first; storage keeps its case. The existence
    /// check and the write are separate calls. A folder created in between
    /// under the same name surfaces as a conflict from the store, but one
    /// differing only in case is created alongside it.
    pub async fn create_folder(&self, raw_name: &str) -> Result<CreatedFolder> {
        let name = require_folder_name(raw_name)?;

        if self.folder_exists(&name).await? {
            return Err(GitDropError::AlreadyExists(format!("folder \"{name}\"")));
        }

        let marker_path = self.file_path(&name, &self.storage.marker_name);
        let put = self
            .store
            .put_object(
                &marker_path,
                &STANDARD.encode(MARKER_CONTENT),
                &format!("Create folder: {name}"),
                None,
            )
            .await
            .map_err(|e| e.context(&format!("failed to create folder \"{name}\"")))?;

        info!(folder = %name, "Folder created");
        Ok(CreatedFolder {
            path: self.folder_path(&name),
            name,
            marker_version_token: put.version_token,
        })
    }

    /// Delete a folder and every object under it, one object at a time.
    ///
    /// Stops at the first failure and returns it. Objects deleted before
    /// that stay deleted; there is nothing to roll back to. Returns the
    /// number of objects removed.
    pub async fn delete_folder(&self, raw_name: &str) -> Result<usize> {
        let name = require_folder_name(raw_name)?;
        let fail = |e: GitDropError| e.context(&format!("failed to delete folder \"{name}\""));

        let mut removed = 0;
        let mut pending = vec![self.folder_path(&name)];
        while let Some(dir) = pending.pop() {
            let items = self.store.get_contents(&dir).await.map_err(fail)?;
            for item in items {
                if item.kind == ItemKind::Dir {
                    pending.push(item.path);
                    continue;
                }
                self.store
                    .delete_object(
                        &item.path,
                        &item.sha,
                        &format!("Delete {} from folder {}", item.name, name),
                    )
                    .await
                    .map_err(|e| {
                        warn!(path = %item.path, removed, "Folder deletion stopped");
                        fail(e)
                    })?;
                removed += 1;
                debug!(path = %item.path, "Deleted");
            }
        }

        info!(folder = %name, removed, "Folder deleted");
        Ok(removed)
    }

    /// Number of files in a folder, marker excluded. A missing folder has none.
    ///
    /// `folder` is sanitized the same way folder creation does.
    pub async fn folder_file_count(&self, folder: &str) -> Result<usize> {
        let folder = sanitize_folder_name(folder);
        match self.store.get_contents(&self.folder_path(&folder)).await {
            Ok(items) => Ok(items
                .iter()
                .filter(|item| self.is_listed_file(item.kind, &item.name))
                .count()),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e.context("failed to count files")),
        }
    }

    fn is_listed_file(&self, kind: ItemKind, name: &str) -> bool {
        kind == ItemKind::File && name != self.storage.marker_name
    }

    /// List the files of `folder`, or of the current folder when `None`.
    ///
    /// An explicit `folder` is sanitized first. A missing folder lists as
    /// empty.
    pub async fn list_files(
        &self,
        ctx: &FolderContext,
        folder: Option<&str>,
    ) -> Result<Vec<FileEntry>> {
        let folder = match folder {
            Some(raw) => sanitize_folder_name(raw),
            None => ctx.current().to_string(),
        };
        let folder = folder.as_str();
        let items = match self.store.get_contents(&self.folder_path(folder)).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.context("failed to list files")),
        };

        Ok(items
            .into_iter()
            .filter(|item| self.is_listed_file(item.kind, &item.name))
            .map(|item| FileEntry {
                public_url: self.public_url(folder, &item.name),
                kind: classify_extension(&item.name),
                download_url: item.download_url.unwrap_or_default(),
                size_bytes: item.size,
                version_token: item.sha,
                path: item.path,
                name: item.name,
            })
            .collect())
    }

    /// Upload one file into the current folder.
    ///
    /// An existing object with the same name is overwritten (last writer
    /// wins): its current token is looked up first and sent with the write.
    /// If someone else writes the path between the lookup and the write,
    /// the store rejects it as a conflict.
    pub async fn upload_file(&self, ctx: &FolderContext, file: &UploadFile) -> Result<UploadedFile> {
        if !is_valid_filename(&file.name) {
            return Err(GitDropError::Validation(format!(
                "invalid file name {:?}",
                file.name
            )));
        }

        let path = self.file_path(ctx.current(), &file.name);
        let content = STANDARD.encode(&file.content);

        match self.put_file(&path, &content, &file.name).await {
            Ok(put) => {
                info!(path = %path, "File uploaded");
                Ok(UploadedFile {
                    name: file.name.clone(),
                    version_token: put.version_token,
                })
            }
            Err(e) => {
                error!(path = %path, error = %e, "Upload failed");
                Err(e.context(&format!("failed to upload {}", file.name)))
            }
        }
    }

    async fn put_file(&self, path: &str, content: &str, name: &str) -> Result<PutResult> {
        let existing = self.store.find_object(path).await?;
        let token = existing.as_ref().map(|item| item.sha.as_str());
        self.store
            .put_object(path, content, &format!("Upload {name}"), token)
            .await
    }

    /// Upload files one after another into the current folder.
    ///
    /// A failed file is recorded and the batch moves on. `on_progress` runs
    /// after every attempt. Outcomes come back in input order.
    pub async fn upload_files<F>(
        &self,
        ctx: &FolderContext,
        files: &[UploadFile],
        mut on_progress: F,
    ) -> Vec<UploadOutcome>
    where
        F: FnMut(&UploadProgress),
    {
        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, file) in files.iter().enumerate() {
            let result = self.upload_file(ctx, file).await;
            if let Err(ref e) = result {
                warn!(file = %file.name, error = %e, "Skipping failed upload");
            }
            outcomes.push(UploadOutcome {
                file: file.name.clone(),
                result,
            });
            on_progress(&UploadProgress::new(index + 1, total, &file.name));
        }

        let succeeded = outcomes.iter().filter(|o| o.success()).count();
        info!(total, succeeded, folder = %ctx.current(), "Batch upload finished");
        outcomes
    }

    /// Delete one file from the current folder.
    pub async fn delete_file(
        &self,
        ctx: &FolderContext,
        name: &str,
        version_token: &str,
    ) -> Result<()> {
        let path = self.file_path(ctx.current(), name);
        self.store
            .delete_object(&path, version_token, &format!("Delete {name}"))
            .await
            .map_err(|e| e.context("failed to delete file"))?;

        info!(path = %path, "File deleted");
        Ok(())
    }
}

/// Sanitized folder name, or a validation error for blank input.
fn require_folder_name(raw: &str) -> Result<String> {
    let name = sanitize_folder_name(raw);
    if name.is_empty() {
        return Err(GitDropError::Validation(
            "folder name is required".to_string(),
        ));
    }
    Ok(name)
}

/// Folders whose name contains `keyword`, ignoring case. A blank keyword
/// keeps everything.
pub fn filter_folders<'a>(folders: &'a [FolderEntry], keyword: &str) -> Vec<&'a FolderEntry> {
    let keyword = keyword.trim().to_lowercase();
    folders
        .iter()
        .filter(|f| keyword.is_empty() || f.name.to_lowercase().contains(&keyword))
        .collect()
}
