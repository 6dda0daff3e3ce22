//! Image blob storage
//!
//! Uploaded images live under `<session_id>/<file name>` and are handed to
//! the vision model as time-limited read URLs.

mod azure_blob;
mod local;

pub use azure_blob::AzureBlobStore;
pub use local::LocalBlobStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Storage collaborator
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing blob
    async fn upload(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<()>;

    /// URL granting read access to `path` for roughly `ttl`
    async fn temporary_read_url(&self, path: &str, ttl: Duration) -> Result<String>;
}

/// Build the configured backend
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::AzureBlob => Ok(Arc::new(AzureBlobStore::from_config(config)?)),
        StorageBackend::Local => Ok(Arc::new(LocalBlobStore::new(config.local_root.clone()))),
    }
}

/// Blob path for an image uploaded in a session
pub fn blob_path(session_id: &str, file_name: &str) -> String {
    format!("{}/{}", session_id, sanitize_file_name(file_name))
}

/// Final path component only, with characters outside a conservative set
/// replaced by `_`
pub fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// MIME type guessed from the file extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
