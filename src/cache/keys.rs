//! Cache key derivation.
//!
//! Raw paths are never used as keys: they can be arbitrarily long and may carry
//! characters a remote backend rejects. A key is the namespace prefix followed
//! by the lowercase hex SHA-224 digest of the path bytes, so it is ASCII-safe,
//! fixed-length and stable across process restarts.
//!
//! Distinct paths can in theory share a digest. The resolution cache therefore
//! compares a cached record's own URL with the requested path before serving it.

use sha2::{Digest, Sha224};

/// Namespace shared by every page resolution entry.
pub const KEY_PREFIX: &str = "pageurl_";

/// Derive the cache key for a request path.
pub fn derive_key(path: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(path.as_bytes());
    format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}
