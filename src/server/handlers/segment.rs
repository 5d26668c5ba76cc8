use crate::{
    error::{RelayError, Result},
    http_retry::{SegmentFetchError, fetch_segment},
    proxy::link::{LinkParams, ProxyLink},
    server::state::AppState,
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::info;

/// Proxy a media segment from origin to player.
///
/// Retries only on HTTP 502; any other origin status is streamed back
/// as-is. The body is streamed rather than buffered — segments are the
/// high-volume path.
pub async fn handle_segment(
    Query(params): Query<LinkParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let link = ProxyLink::from_params(params)?;
    let origin_url = link.resolve()?;
    super::check_origin(&state, &origin_url)?;

    info!("Serving segment from origin: {}", origin_url);

    let response = fetch_segment(
        &state.http_client,
        &origin_url,
        &link.header_map()?,
        &state.retry_config(),
    )
    .await
    .map_err(|e| match e {
        SegmentFetchError::Transport(e) => RelayError::OriginUnreachable(e),
        SegmentFetchError::BadGatewayExhausted { attempts } => RelayError::UpstreamBadGateway {
            url: origin_url.to_string(),
            attempts,
        },
    })?;

    let status = response.status();
    let body = Body::from_stream(response.bytes_stream());

    Ok((
        status,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response())
}
