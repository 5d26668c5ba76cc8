use crate::{
    error::{RelayError, Result},
    proxy::link::parse_header_bundle,
    proxy::manifest::build_manifest,
    server::state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;
use url::Url;

pub const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

#[derive(Debug, Deserialize)]
pub struct ProxifyParams {
    /// Origin manifest URL.
    pub url: String,
    /// JSON header map forwarded on every origin hop.
    pub headers: Option<String>,
}

/// Entry point of the relay: fetch the origin manifest, rewrite every
/// URI in it to route back through the relay, and return the text.
pub async fn proxify(
    Query(params): Query<ProxifyParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let origin_url = Url::parse(&params.url)
        .map_err(|e| RelayError::MalformedLink(format!("invalid origin URL: {e}")))?;
    super::check_origin(&state, &origin_url)?;

    let headers = parse_header_bundle(params.headers.as_deref())?;

    info!("Proxifying manifest from origin: {}", origin_url);

    let body = build_manifest(
        &state.http_client,
        &state.retry_config(),
        &origin_url,
        &headers,
    )
    .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, HLS_CONTENT_TYPE)],
        body,
    )
        .into_response())
}
