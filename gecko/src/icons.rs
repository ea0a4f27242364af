//! Bounded icon cache.
//!
//! Icons are fetched lazily on first request and kept in a size-bounded moka
//! cache keyed by asset id, so the cache never outgrows the tracked set.

use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::error::Result;
use crate::rest::GeckoHttpClient;

/// A fetched icon image.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub content_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl Icon {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone)]
pub struct IconCache {
    http: GeckoHttpClient,
    cache: Cache<String, Icon>,
}

impl IconCache {
    pub fn new(http: GeckoHttpClient, capacity: u64) -> Self {
        Self {
            http,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Return the cached icon for `asset_id`, fetching `url` on a miss.
    pub async fn get_or_fetch(&self, asset_id: &str, url: &str) -> Result<Icon> {
        if let Some(icon) = self.cache.get(asset_id).await {
            debug!(asset_id, "icon cache hit");
            return Ok(icon);
        }

        let raw = self.http.get_raw(url).await?;
        let icon = Icon {
            content_type: raw.content_type,
            bytes: Arc::from(raw.bytes),
        };
        debug!(asset_id, bytes = icon.len(), "icon fetched");
        self.cache.insert(asset_id.to_string(), icon.clone()).await;
        Ok(icon)
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Apply pending evictions; entry counts are eventually consistent otherwise.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}
