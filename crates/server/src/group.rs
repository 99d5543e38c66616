//! Work-zone group resolution.
//!
//! A single work zone may be split across multiple numbered blob parts;
//! the parts share a `group_id` metadata tag. Given a caller-facing id,
//! the resolver locates the canonical blob, reads its group id, and
//! downloads every sibling blob carrying the same group id.

use crate::error::{ApiError, ApiResult};
use bytes::Bytes;
use flagger_core::FileKind;
use flagger_storage::{BlobStore, StorageError};
use serde::Serialize;

/// One downloaded file of a work-zone group.
#[derive(Debug, Serialize)]
pub struct GroupFile {
    /// Full stored blob name.
    pub source_name: String,
    /// Blob size in bytes.
    pub size: u64,
    /// Blob content: UTF-8 text for the XML/GeoJSON kinds, a
    /// stringified byte list for the UPER binary kind.
    pub data: String,
}

/// Response for a work-zone group fetch.
#[derive(Debug, Serialize)]
pub struct GroupResult {
    /// Number of files returned.
    pub num_files: usize,
    /// The resolved group id, or "unknown".
    pub id: String,
    /// The group's files, in listing order.
    pub files: Vec<GroupFile>,
}

/// Resolve a public id to its work-zone group and download its files.
///
/// A canonical blob whose group id is "unknown" yields an empty file
/// collection: with no group tag, siblings cannot be enumerated. This
/// mirrors the source system and is deliberate.
pub async fn resolve(
    storage: &dyn BlobStore,
    kind: FileKind,
    public_id: &str,
) -> ApiResult<GroupResult> {
    let canonical = kind.canonical_key(public_id);

    let metadata = match storage.head_metadata(&canonical).await {
        Ok(metadata) => metadata,
        // A traversal-shaped id can't name a blob either way.
        Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
            return Err(not_found(kind));
        }
        Err(e) => return Err(e.into()),
    };

    let group_id = metadata
        .get("group_id")
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());

    if group_id == "unknown" {
        return Ok(GroupResult {
            num_files: 0,
            id: group_id,
            files: Vec::new(),
        });
    }

    let mut files = Vec::new();
    for entry in storage
        .list_with_metadata(&kind.group_prefix(public_id))
        .await?
    {
        if entry.meta("group_id") != Some(group_id.as_str()) {
            continue;
        }
        let data = storage.get(&entry.key).await?;
        files.push(GroupFile {
            source_name: entry.key,
            size: entry.size,
            data: render(kind, &data),
        });
    }

    Ok(GroupResult {
        num_files: files.len(),
        id: group_id,
        files,
    })
}

fn not_found(kind: FileKind) -> ApiError {
    ApiError::NotFound(format!(
        "Specified {kind} file not found. Try the /{kind} listing endpoint to \
         return a list of current files."
    ))
}

/// Render blob bytes for the JSON response.
///
/// UPER blobs are opaque binary and get a byte-list rendering; the text
/// kinds decode lossily rather than failing the whole group on a stray
/// invalid byte.
fn render(kind: FileKind, data: &Bytes) -> String {
    if kind.is_binary() {
        format!("{:?}", data.as_ref())
    } else {
        String::from_utf8_lossy(data).into_owned()
    }
}
