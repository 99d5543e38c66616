//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// One blob in a listing, with its user metadata.
///
/// This is a read-only view of an object owned by the external storage
/// service. An empty metadata map means the blob carries no metadata at
/// all; the selection engine skips such blobs.
#[derive(Clone, Debug, PartialEq)]
pub struct BlobEntry {
    /// Full stored name, including the kind subdirectory.
    pub key: String,
    /// Blob size in bytes.
    pub size: u64,
    /// User metadata key/value pairs.
    pub metadata: HashMap<String, String>,
}

impl BlobEntry {
    /// Look up a metadata value.
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    /// The blob's group id, defaulting to the literal "unknown".
    pub fn group_id(&self) -> &str {
        self.meta("group_id").unwrap_or("unknown")
    }
}

/// Read-only blob store abstraction.
///
/// The API never writes through this trait; backends may expose their
/// own write helpers for seeding and operational tooling.
#[async_trait]
pub trait BlobStore: std::fmt::Debug + Send + Sync + 'static {
    /// List every blob under a prefix, including user metadata.
    ///
    /// The full prefix is scanned on every call (no pagination is
    /// surfaced) and entries are returned in whatever order the
    /// backend yields them.
    async fn list_with_metadata(&self, prefix: &str) -> StorageResult<Vec<BlobEntry>>;

    /// Fetch a single blob's user metadata without downloading it.
    ///
    /// Returns [`crate::StorageError::NotFound`] when the blob is absent.
    async fn head_metadata(&self, key: &str) -> StorageResult<HashMap<String, String>>;

    /// Download a blob's full content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get the name of this storage backend ("s3", "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity. Called at startup so configuration
    /// errors surface before the server accepts requests.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
