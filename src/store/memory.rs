//! In-process content store.
//!
//! Mirrors the remote store's semantics closely enough to exercise the
//! content manager without a network: directories are implied by path
//! prefixes, version tokens are content hashes, and stale or missing tokens
//! are rejected as conflicts.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use super::{ContentItem, ContentStore, ItemKind, PutResult};
use crate::{GitDropError, Result};

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, Vec<u8>>,
    failing: HashSet<String>,
    commits: Vec<String>,
}

/// Content store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

/// Version token for a blob: sha-256 over a git-style blob header and body.
fn blob_token(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place an object directly, bypassing token checks and commit history.
    pub fn insert(&self, path: &str, content: Vec<u8>) -> String {
        let token = blob_token(&content);
        self.lock()
            .objects
            .insert(normalize(path).to_string(), content);
        token
    }

    /// Content of the object at `path`.
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(normalize(path)).cloned()
    }

    /// Current version token of the object at `path`.
    pub fn version_token(&self, path: &str) -> Option<String> {
        self.lock().objects.get(normalize(path)).map(|c| blob_token(c))
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    /// Commit messages of every successful write and delete, oldest first.
    pub fn commits(&self) -> Vec<String> {
        self.lock().commits.clone()
    }

    /// Make every later write or delete of `path` fail with a server error.
    pub fn fail_writes_to(&self, path: &str) {
        self.lock().failing.insert(normalize(path).to_string());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    fn injected_failure(inner: &Inner, path: &str) -> Result<()> {
        if inner.failing.contains(path) {
            return Err(GitDropError::Remote {
                status: 500,
                message: format!("injected failure for {path}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_contents(&self, path: &str) -> Result<Vec<ContentItem>> {
        let path = normalize(path);
        let inner = self.lock();

        if let Some(content) = inner.objects.get(path) {
            return Ok(vec![ContentItem {
                name: last_segment(path).to_string(),
                path: path.to_string(),
                kind: ItemKind::File,
                sha: blob_token(content),
                size: content.len() as u64,
                download_url: Some(format!("memory:///{path}")),
            }]);
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut files = Vec::new();
        let mut dirs: BTreeMap<String, Sha256> = BTreeMap::new();
        for (key, content) in inner.objects.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    let hasher = dirs.entry(dir.to_string()).or_default();
                    hasher.update(key.as_bytes());
                    hasher.update(blob_token(content).as_bytes());
                }
                None => files.push(ContentItem {
                    name: rest.to_string(),
                    path: key.clone(),
                    kind: ItemKind::File,
                    sha: blob_token(content),
                    size: content.len() as u64,
                    download_url: Some(format!("memory:///{key}")),
                }),
            }
        }

        if files.is_empty() && dirs.is_empty() {
            return Err(GitDropError::NotFound(path.to_string()));
        }

        let mut items: Vec<ContentItem> = dirs
            .into_iter()
            .map(|(name, hasher)| ContentItem {
                path: format!("{prefix}{name}"),
                name,
                kind: ItemKind::Dir,
                sha: format!("{:x}", hasher.finalize()),
                size: 0,
                download_url: None,
            })
            .collect();
        items.extend(files);
        items.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(items)
    }

    async fn put_object(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<PutResult> {
        let path = normalize(path);
        let bytes = STANDARD.decode(content).map_err(|e| GitDropError::Remote {
            status: 422,
            message: format!("content is not valid Base64: {e}"),
        })?;

        let mut inner = self.lock();
        Self::injected_failure(&inner, path)?;

        let dir_prefix = format!("{path}/");
        if path.is_empty() || inner.objects.keys().any(|k| k.starts_with(&dir_prefix)) {
            return Err(GitDropError::Remote {
                status: 422,
                message: format!("{path:?} is a directory"),
            });
        }

        if let Some(parent) = path
            .match_indices('/')
            .map(|(i, _)| &path[..i])
            .find(|prefix| inner.objects.contains_key(*prefix))
        {
            return Err(GitDropError::Remote {
                status: 422,
                message: format!("{parent:?} is a file"),
            });
        }

        match (inner.objects.get(path), version_token) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(GitDropError::Conflict(format!(
                    "sha supplied for missing object {path}"
                )));
            }
            (Some(_), None) => {
                return Err(GitDropError::Conflict(format!(
                    "\"sha\" wasn't supplied for existing object {path}"
                )));
            }
            (Some(existing), Some(token)) => {
                if blob_token(existing) != token {
                    return Err(GitDropError::Conflict(format!(
                        "{path} does not match {token}"
                    )));
                }
            }
        }

        let new_token = blob_token(&bytes);
        inner.objects.insert(path.to_string(), bytes);
        inner.commits.push(message.to_string());

        Ok(PutResult {
            version_token: new_token,
        })
    }

    async fn delete_object(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        let path = normalize(path);
        let mut inner = self.lock();
        Self::injected_failure(&inner, path)?;

        let current = inner
            .objects
            .get(path)
            .map(|c| blob_token(c))
            .ok_or_else(|| GitDropError::NotFound(path.to_string()))?;
        if current != version_token {
            return Err(GitDropError::Conflict(format!(
                "{path} does not match {version_token}"
            )));
        }

        inner.objects.remove(path);
        inner.commits.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_contents("storage").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_listing_groups_directories() {
        let store = MemoryStore::new();
        store.insert("storage/a/.gitkeep", b"\n".to_vec());
        store.insert("storage/a/one.txt", b"1".to_vec());
        store.insert("storage/b/deep/two.txt", b"2".to_vec());
        store.insert("storage/readme.md", b"r".to_vec());
        store.insert("storage-other/x.txt", b"x".to_vec());

        let items = store.get_contents("storage").await.unwrap();
        let names: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("a", ItemKind::Dir),
                ("b", ItemKind::Dir),
                ("readme.md", ItemKind::File),
            ]
        );
        assert_eq!(items[1].path, "storage/b");

        let inner = store.get_contents("storage/a").await.unwrap();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[1].size, 1);
    }

    #[tokio::test]
    async fn test_file_path_lists_single_item() {
        let store = MemoryStore::new();
        let token = store.insert("storage/a/one.txt", b"1".to_vec());

        let items = store.get_contents("storage/a/one.txt").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sha, token);
    }

    #[tokio::test]
    async fn test_create_then_update_with_token() {
        let store = MemoryStore::new();
        let created = store
            .put_object("storage/a/x.txt", &b64(b"one"), "Upload x.txt", None)
            .await
            .unwrap();

        let updated = store
            .put_object(
                "storage/a/x.txt",
                &b64(b"two"),
                "Upload x.txt",
                Some(&created.version_token),
            )
            .await
            .unwrap();

        assert_ne!(created.version_token, updated.version_token);
        assert_eq!(store.object("storage/a/x.txt").unwrap(), b"two");
        assert_eq!(store.commits().len(), 2);
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let store = MemoryStore::new();
        store.insert("storage/a/x.txt", b"one".to_vec());

        let err = store
            .put_object("storage/a/x.txt", &b64(b"two"), "Upload x.txt", None)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let store = MemoryStore::new();
        let stale = store.insert("storage/a/x.txt", b"one".to_vec());
        store.insert("storage/a/x.txt", b"changed".to_vec());

        let err = store
            .put_object("storage/a/x.txt", &b64(b"two"), "Upload", Some(&stale))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = store
            .delete_object("storage/a/x.txt", &stale, "Delete")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(store.object("storage/a/x.txt").is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete_object("storage/a/x.txt", "abc", "Delete")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_invalid_base64() {
        let store = MemoryStore::new();
        let err = store
            .put_object("storage/a/x.txt", "@@not base64@@", "Upload", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitDropError::Remote { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_put_onto_directory_rejected() {
        let store = MemoryStore::new();
        store.insert("storage/a/x.txt", b"1".to_vec());
        let err = store
            .put_object("storage/a", &b64(b"1"), "Upload", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitDropError::Remote { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_put_below_file_rejected() {
        let store = MemoryStore::new();
        store.insert("storage/a", b"plain".to_vec());
        let err = store
            .put_object("storage/a/.gitkeep", &b64(b"\n"), "Create folder: a", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitDropError::Remote { status: 422, .. }));

        let items = store.get_contents("storage/a").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::File);
        assert!(store.object("storage/a/.gitkeep").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_paths_differing_in_case_are_distinct() {
        let store = MemoryStore::new();
        store
            .put_object("storage/photos/.gitkeep", &b64(b"\n"), "Create folder: photos", None)
            .await
            .unwrap();
        store
            .put_object("storage/Photos/.gitkeep", &b64(b"\n"), "Create folder: Photos", None)
            .await
            .unwrap();

        let names: Vec<_> = store
            .get_contents("storage")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Photos", "photos"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_writes_to("storage/a/bad.txt");

        let err = store
            .put_object("storage/a/bad.txt", &b64(b"1"), "Upload", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitDropError::Remote { status: 500, .. }));
        assert!(store.is_empty());

        store.clear_failures();
        store
            .put_object("storage/a/bad.txt", &b64(b"1"), "Upload", None)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_blob_token_depends_on_content() {
        assert_eq!(blob_token(b"a"), blob_token(b"a"));
        assert_ne!(blob_token(b"a"), blob_token(b"b"));
        assert_eq!(blob_token(b"").len(), 64);
    }
}
