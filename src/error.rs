use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Relay-wide error type.
///
/// Every failure surfaces directly to the client as an HTTP error
/// response; there is no fallback content and no partial output.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Origin could not be reached after the retry budget was exhausted,
    /// or a response body could not be read.
    #[error("origin unreachable: {0}")]
    OriginUnreachable(#[from] reqwest::Error),

    /// Segment origin kept answering 502 for the whole retry budget.
    #[error("origin returned 502 for {url} on all {attempts} attempts")]
    UpstreamBadGateway { url: String, attempts: u32 },

    /// Fetched body is not a valid HLS manifest.
    #[error("failed to parse manifest: {0}")]
    ParseError(String),

    /// A relay-internal URL is missing required fields or carries an
    /// invalid header payload.
    #[error("malformed relay link: {0}")]
    MalformedLink(String),

    /// User-supplied origin URL rejected by SSRF validation.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::OriginUnreachable(_)
            | RelayError::UpstreamBadGateway { .. }
            | RelayError::ParseError(_) => StatusCode::BAD_GATEWAY,
            RelayError::MalformedLink(_) => StatusCode::BAD_REQUEST,
            RelayError::InvalidOrigin(_) => StatusCode::FORBIDDEN,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Request failed with {}: {}", status, self);
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
