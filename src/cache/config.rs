//! Cache configuration.
//!
//! Controls the page resolution cache via `flexpage.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_TTL_SECONDS: u64 = 2 * 60;
const DEFAULT_CAPACITY: usize = 1000;

/// Cache configuration from `flexpage.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the resolution cache. When off, every lookup reaches the store.
    pub enabled: bool,
    /// Expiry applied to both positive and negative entries.
    pub ttl_seconds: u64,
    /// Maximum entries held by the in-memory backend.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl.as_secs(),
            capacity: settings.capacity.get(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl(), Duration::from_secs(120));
        assert_eq!(config.capacity, 1000);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
