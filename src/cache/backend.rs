//! Cache backends.
//!
//! The resolution cache talks to its storage through [`CacheBackend`], injected
//! at construction. Backends are free to fail: every error is absorbed by the
//! caller and degrades to a miss (reads) or a skipped write.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;

use crate::domain::entities::PageRecord;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

/// A cached resolution outcome.
///
/// An absent entry (never queried or expired) is represented by `None` at the
/// backend boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The store returned this page.
    Hit(PageRecord),
    /// The store confirmed that no page is configured for the path.
    NegativeHit,
}

#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

impl CacheBackendError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the unexpired entry stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheBackendError>;

    /// Stores `entry` under `key`, replacing any previous value.
    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration)
    -> Result<(), CacheBackendError>;

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError>;

    async fn clear(&self) -> Result<(), CacheBackendError>;
}

struct StoredEntry {
    entry: CacheEntry,
    expires_at: Instant,
}

/// Process-local backend with LRU eviction and per-entry expiry.
///
/// Expired entries are dropped lazily when read.
pub struct MemoryBackend {
    entries: RwLock<LruCache<String, StoredEntry>>,
}

impl MemoryBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.capacity_non_zero())
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, "memory_backend.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheBackendError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, "memory_backend.get");

        let fresh = entries
            .get(key)
            .map(|stored| (stored.expires_at > now).then(|| stored.entry.clone()));

        match fresh {
            None => Ok(None),
            Some(Some(entry)) => Ok(Some(entry)),
            Some(None) => {
                entries.pop(key);
                Ok(None)
            }
        }
    }

    async fn set(
        &self,
        key: &str,
        entry: CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheBackendError> {
        let stored = StoredEntry {
            entry,
            expires_at: Instant::now() + ttl,
        };

        let displaced = rw_write(&self.entries, "memory_backend.set").push(key.to_string(), stored);
        // `push` also hands back the previous value of a replaced key.
        if displaced.is_some_and(|(evicted_key, _)| evicted_key != key) {
            counter!("flexpage_cache_evict_total").increment(1);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        rw_write(&self.entries, "memory_backend.delete").pop(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheBackendError> {
        rw_write(&self.entries, "memory_backend.clear").clear();
        Ok(())
    }
}
