//! Local filesystem storage backend.
//!
//! Blob bytes live at `<root>/<key>`; user metadata lives in a JSON
//! sidecar at `<root>/<key>.meta.json`. A blob without a sidecar has an
//! empty metadata map.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobEntry, BlobStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Suffix marking a metadata sidecar file.
const META_SUFFIX: &str = ".meta.json";

/// Local filesystem blob store.
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the full path for a key, rejecting traversal attempts.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidKey(key.to_string())),
            }
        }
        Ok(self.root.join(key))
    }

    fn meta_path(&self, key: &str) -> StorageResult<PathBuf> {
        self.key_path(&format!("{key}{META_SUFFIX}"))
    }

    /// Write a blob together with its metadata sidecar.
    ///
    /// Not part of [`BlobStore`]: the API surface is read-only, but
    /// local deployments and tests need a way to seed data.
    pub async fn put_with_metadata(
        &self,
        key: &str,
        data: Bytes,
        metadata: &HashMap<String, String>,
    ) -> StorageResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;

        let sidecar = serde_json::to_vec_pretty(metadata).map_err(|e| {
            StorageError::InvalidMetadata {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        fs::write(self.meta_path(key)?, sidecar).await?;
        Ok(())
    }

    /// Write a blob without any metadata sidecar.
    pub async fn put_without_metadata(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;
        Ok(())
    }

    async fn read_sidecar(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        let meta_path = self.meta_path(key)?;
        match fs::read(&meta_path).await {
            Ok(raw) => {
                serde_json::from_slice(&raw).map_err(|e| StorageError::InvalidMetadata {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Recursively collect blob keys under the root (sidecars excluded).
    fn collect_keys_sync(root: &Path) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            for entry in entries {
                let entry = entry.map_err(StorageError::Io)?;
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let relative = path
                    .strip_prefix(root)
                    .map_err(|_| StorageError::InvalidKey(path.display().to_string()))?;
                let key = relative.to_string_lossy().replace('\\', "/");
                if !key.ends_with(META_SUFFIX) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl BlobStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list_with_metadata(&self, prefix: &str) -> StorageResult<Vec<BlobEntry>> {
        let root = self.root.clone();
        let keys = tokio::task::spawn_blocking(move || Self::collect_keys_sync(&root))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })??;

        let mut entries = Vec::new();
        for key in keys {
            if !key.starts_with(prefix) {
                continue;
            }
            let size = fs::metadata(self.key_path(&key)?).await?.len();
            let metadata = self.read_sidecar(&key).await?;
            entries.push(BlobEntry { key, size, metadata });
        }
        // Stable order keeps local listings deterministic; the trait
        // itself makes no ordering promise.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head_metadata(&self, key: &str) -> StorageResult<HashMap<String, String>> {
        let path = self.key_path(key)?;
        match fs::try_exists(&path).await {
            Ok(true) => self.read_sidecar(key).await,
            Ok(false) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> StorageResult<()> {
        if fs::try_exists(&self.root).await? {
            Ok(())
        } else {
            Err(StorageError::Config(format!(
                "storage root missing: {}",
                self.root.display()
            )))
        }
    }
}
