//! Root-relative page paths.
//!
//! A storable path starts and ends with `/` and every segment in between is
//! made of lowercase ASCII letters, digits and hyphens. `/` alone is the root.
//! The check is purely syntactic: nothing is normalized, so `/posts/../posts/`
//! is rejected rather than rewritten to `/posts/`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::DomainError;

#[allow(clippy::unwrap_used)]
static ROOT_RELATIVE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([a-z0-9-]+/)*$").unwrap());

/// Returns `true` when `path` could be stored as a page URL.
pub fn is_root_relative_path(path: &str) -> bool {
    ROOT_RELATIVE_PATH_RE.is_match(path)
}

/// Field-level validation rule for page URLs.
pub fn validate_root_relative_path(path: &str) -> Result<(), DomainError> {
    if is_root_relative_path(path) {
        return Ok(());
    }

    Err(DomainError::validation(
        "url",
        "the URL must start and end with a slash, and may only contain lowercase \
         letters, numbers and hyphens (-)",
    ))
}
