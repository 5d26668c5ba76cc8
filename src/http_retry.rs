//! HTTP fetch with bounded retry.
//!
//! Two retry policies live here, matching the two classes of origin
//! traffic the relay carries:
//!
//! - [`fetch_with_retry`] — manifests and keys: low-volume control-plane
//!   fetches, retried on any transport error or non-2xx status.
//! - [`fetch_segment`] — media segments: high-volume and time-sensitive,
//!   retried only on HTTP 502; every other outcome is returned
//!   immediately so the player can react.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default number of fetch attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff between attempts in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 250;

/// Configuration for the retry combinators.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (minimum 1; 0 is treated as 1).
    pub max_attempts: u32,
    /// Sleep duration between consecutive attempts.
    pub backoff: Duration,
    /// Optional per-request timeout applied to each individual attempt.
    ///
    /// When `None`, the client's own timeout applies.
    pub timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            timeout: None,
        }
    }
}

/// Failure modes of the segment-policy fetch.
#[derive(Debug, Error)]
pub enum SegmentFetchError {
    /// Transport-level failure; not retried for segments.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Origin answered 502 on every attempt.
    #[error("origin returned 502 on all {attempts} attempts")]
    BadGatewayExhausted { attempts: u32 },
}

fn request(client: &Client, url: &Url, headers: &HeaderMap, config: &RetryConfig) -> reqwest::RequestBuilder {
    let mut request = client.get(url.clone()).headers(headers.clone());
    if let Some(timeout) = config.timeout {
        request = request.timeout(timeout);
    }
    request
}

/// Fetch a URL via HTTP GET, retrying on any failure.
///
/// Attempts the request up to `config.max_attempts` times, sleeping
/// `config.backoff` between attempts. A non-2xx status counts as a
/// failure. Returns the first successful [`Response`], or the last
/// [`reqwest::Error`] once the budget is exhausted — exhaustion is
/// always an explicit error, never a stale response.
///
/// # Errors
///
/// Returns the last network or non-2xx error after all retries fail.
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    headers: &HeaderMap,
    config: &RetryConfig,
) -> Result<Response, reqwest::Error> {
    let max_attempts = config.max_attempts.max(1);

    // Retry loop: attempts 1 through N-1, with backoff between each.
    // The final attempt is handled separately below to guarantee a
    // return without `unreachable!()` or other panic paths.
    for attempt in 1..max_attempts {
        match request(client, url, headers, config).send().await {
            Ok(response) if response.status().is_success() => return Ok(response),

            Ok(response) => {
                warn!(
                    "HTTP fetch returned {} for {} (attempt {}/{})",
                    response.status(),
                    url,
                    attempt,
                    max_attempts
                );
            }

            Err(e) => {
                warn!(
                    "HTTP fetch failed for {} (attempt {}/{}): {}",
                    url, attempt, max_attempts, e
                );
            }
        }

        warn!("Retrying HTTP fetch in {}ms...", config.backoff.as_millis());
        tokio::time::sleep(config.backoff).await;
    }

    // Final attempt — returns directly, no further retry
    let response = request(client, url, headers, config).send().await.map_err(|e| {
        warn!(
            "HTTP fetch failed for {} (attempt {}/{}): {}",
            url, max_attempts, max_attempts, e
        );
        e
    })?;

    if !response.status().is_success() {
        warn!(
            "HTTP fetch returned {} for {} (attempt {}/{})",
            response.status(),
            url,
            max_attempts,
            max_attempts
        );
    }

    response.error_for_status()
}

/// Fetch a media segment, retrying only on HTTP 502.
///
/// Any other status — success or not — is returned to the caller
/// immediately so it can be passed through to the player. Transport
/// errors are not retried either.
///
/// # Errors
///
/// [`SegmentFetchError::Transport`] on a network failure, or
/// [`SegmentFetchError::BadGatewayExhausted`] when every attempt came
/// back 502.
pub async fn fetch_segment(
    client: &Client,
    url: &Url,
    headers: &HeaderMap,
    config: &RetryConfig,
) -> Result<Response, SegmentFetchError> {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let response = request(client, url, headers, config).send().await?;

        if response.status() != StatusCode::BAD_GATEWAY {
            return Ok(response);
        }

        warn!(
            "Segment fetch returned 502 for {} (attempt {}/{})",
            url, attempt, max_attempts
        );

        if attempt < max_attempts {
            tokio::time::sleep(config.backoff).await;
        }
    }

    Err(SegmentFetchError::BadGatewayExhausted {
        attempts: max_attempts,
    })
}
