//! Page resolution cache.
//!
//! Maps request paths to page records with a short-lived cache in front of the
//! page store:
//!
//! - **Positive entries** hold the page found for a path.
//! - **Negative entries** record that the store has no page for a path, so
//!   repeated requests for unrelated URLs do not hit the database.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 120
//! capacity = 1000
//! ```

mod backend;
mod config;
mod keys;
mod lock;
mod resolution;

pub use backend::{CacheBackend, CacheBackendError, CacheEntry, MemoryBackend};
pub use config::CacheConfig;
pub use keys::{KEY_PREFIX, derive_key};
pub use resolution::ResolutionCache;
