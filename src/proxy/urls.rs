//! URI classification and base-URL derivation.

use crate::error::{RelayError, Result};
use url::Url;

/// Returns `true` iff `uri` is a complete URL with both a scheme and a
/// host. Malformed input is simply not absolute.
///
/// Protocol-relative references (`//cdn.com/x`) have no scheme and are
/// therefore treated as relative.
pub fn is_absolute_url(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}

/// Directory base of a URL: the URL with its last path segment stripped
/// (the relative reference `"."` resolved against it). The query string
/// does not survive.
///
/// Callers must pass the **final** post-redirect URL of a fetched
/// resource — relative children resolve against where the content
/// actually lives, not where it was requested.
pub fn base_of(url: &Url) -> Result<Url> {
    url.join(".")
        .map_err(|e| RelayError::Internal(format!("cannot derive base of {url}: {e}")))
}
