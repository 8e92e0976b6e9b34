//! Path → page resolution with positive and negative caching.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, error, instrument, warn};

use crate::application::repos::{PageStore, RepoError};
use crate::domain::entities::PageRecord;
use crate::domain::path::is_root_relative_path;

use super::backend::{CacheBackend, CacheEntry};
use super::config::CacheConfig;
use super::keys::derive_key;

/// Resolves request paths to pages, consulting the cache before the store.
///
/// The store stays the source of truth: cache failures are logged and the
/// lookup carries on as a miss. Concurrent misses for the same path are not
/// coalesced; each issues its own store query and the last write wins.
pub struct ResolutionCache {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    store: Arc<dyn PageStore>,
}

impl ResolutionCache {
    pub fn new(
        config: CacheConfig,
        backend: Arc<dyn CacheBackend>,
        store: Arc<dyn PageStore>,
    ) -> Self {
        Self {
            config,
            backend,
            store,
        }
    }

    /// Returns the page configured for `path`, or `None` when there is none.
    ///
    /// Paths that could never be stored are answered without touching the
    /// cache or the store.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, path: &str) -> Result<Option<PageRecord>, RepoError> {
        if !is_root_relative_path(path) {
            debug!(outcome = "invalid_path", "path cannot map to a page");
            return Ok(None);
        }

        if !self.config.enabled {
            return self.store.lookup(path).await;
        }

        let key = derive_key(path);
        match self.read(&key).await {
            Some(CacheEntry::NegativeHit) => {
                counter!("flexpage_resolve_negative_hit_total").increment(1);
                debug!(cache_key = %key, outcome = "negative_hit", "cache reports no page");
                return Ok(None);
            }
            Some(CacheEntry::Hit(page)) if page.url == path => {
                counter!("flexpage_resolve_hit_total").increment(1);
                debug!(cache_key = %key, outcome = "hit", "serving cached page");
                return Ok(Some(page));
            }
            Some(CacheEntry::Hit(page)) => {
                counter!("flexpage_resolve_collision_total").increment(1);
                error!(
                    cache_key = %key,
                    request_path = path,
                    cached_path = %page.url,
                    "cache key collision: cached page belongs to another path; \
                     falling back to the store"
                );
            }
            None => {
                counter!("flexpage_resolve_miss_total").increment(1);
                debug!(cache_key = %key, outcome = "miss", "querying store");
            }
        }

        self.populate(path, &key).await
    }

    /// Drops whatever is cached for `path`, positive or negative.
    ///
    /// Writers call this before reporting a page write as complete.
    #[instrument(skip(self), level = "debug")]
    pub async fn invalidate(&self, path: &str) {
        if !self.config.enabled {
            return;
        }

        let key = derive_key(path);
        match self.backend.delete(&key).await {
            Ok(()) => debug!(cache_key = %key, "invalidated cache entry"),
            Err(err) => {
                counter!("flexpage_cache_backend_error_total", "op" => "delete").increment(1);
                warn!(cache_key = %key, error = %err, "cache invalidation failed");
            }
        }
    }

    /// Drops every cached entry.
    pub async fn clear(&self) {
        if let Err(err) = self.backend.clear().await {
            counter!("flexpage_cache_backend_error_total", "op" => "clear").increment(1);
            warn!(error = %err, "cache clear failed");
        }
    }

    async fn populate(&self, path: &str, key: &str) -> Result<Option<PageRecord>, RepoError> {
        let found = self.store.lookup(path).await?;

        let entry = match &found {
            Some(page) => CacheEntry::Hit(page.clone()),
            None => CacheEntry::NegativeHit,
        };

        match self.backend.set(key, entry, self.config.ttl()).await {
            Ok(()) => debug!(
                cache_key = key,
                found = found.is_some(),
                ttl_seconds = self.config.ttl_seconds,
                "cached store result"
            ),
            Err(err) => {
                counter!("flexpage_cache_backend_error_total", "op" => "set").increment(1);
                warn!(cache_key = key, error = %err, "cache write skipped");
            }
        }

        Ok(found)
    }

    async fn read(&self, key: &str) -> Option<CacheEntry> {
        match self.backend.get(key).await {
            Ok(entry) => entry,
            Err(err) => {
                counter!("flexpage_cache_backend_error_total", "op" => "get").increment(1);
                warn!(cache_key = key, error = %err, "cache read failed; treating as miss");
                None
            }
        }
    }
}
