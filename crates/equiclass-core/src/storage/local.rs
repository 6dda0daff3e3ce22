//! Filesystem backend for development and offline use

use super::{content_type_for, BlobStore};
use crate::error::{EquiclassError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Stores blobs under a root directory. Read URLs are `data:` URLs so the
/// vision model can see the image without a public endpoint; the TTL does
/// not apply.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(EquiclassError::Storage(format!("Invalid blob path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, bytes: &[u8], path: &str, _content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(())
    }

    async fn temporary_read_url(&self, path: &str, _ttl: Duration) -> Result<String> {
        let target = self.resolve(path)?;
        let bytes = tokio::fs::read(&target).await.map_err(|e| {
            EquiclassError::Storage(format!("Cannot read blob {}: {}", path, e))
        })?;
        Ok(format!(
            "data:{};base64,{}",
            content_type_for(path),
            STANDARD.encode(bytes)
        ))
    }
}
