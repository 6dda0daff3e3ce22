//! Time-bounded cache of known manufacturer names

use crate::db::Database;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Where the manufacturer list comes from
#[async_trait]
pub trait ManufacturerSource: Send + Sync {
    async fn fetch_manufacturers(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl ManufacturerSource for Database {
    async fn fetch_manufacturers(&self) -> Result<Vec<String>> {
        self.get_manufacturers()
    }
}

#[derive(Clone)]
struct CachedList {
    names: Vec<String>,
    expires_at: Instant,
}

/// Concurrent misses may both fetch; the last write wins.
pub struct ManufacturerCache {
    source: Arc<dyn ManufacturerSource>,
    ttl: Duration,
    entry: RwLock<Option<CachedList>>,
}

impl ManufacturerCache {
    pub fn new(source: Arc<dyn ManufacturerSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
        }
    }

    fn cached(&self) -> Option<Vec<String>> {
        let entry = self.entry.read().ok()?;
        let cached = entry.as_ref()?;
        if Instant::now() < cached.expires_at {
            Some(cached.names.clone())
        } else {
            None
        }
    }

    /// Cached list, fetched on first use and after expiry. A failed fetch
    /// is returned to the caller and leaves the cache untouched.
    pub async fn get_manufacturers(&self) -> Result<Vec<String>> {
        if let Some(names) = self.cached() {
            return Ok(names);
        }

        let names = self.source.fetch_manufacturers().await?;
        tracing::debug!("Fetched {} manufacturers", names.len());

        match Instant::now().checked_add(self.ttl) {
            Some(expires_at) => {
                if let Ok(mut entry) = self.entry.write() {
                    *entry = Some(CachedList {
                        names: names.clone(),
                        expires_at,
                    });
                }
            }
            None => tracing::warn!("Manufacturer cache lifetime out of range, not caching"),
        }

        Ok(names)
    }
}
