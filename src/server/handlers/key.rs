use crate::{
    error::Result,
    http_retry::fetch_with_retry,
    proxy::link::{LinkParams, ProxyLink},
    server::state::AppState,
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

/// Proxy a decryption key from origin to player.
///
/// Keys are small and fetched once per rendition, so the broad
/// control-plane retry policy applies.
pub async fn handle_key(
    Query(params): Query<LinkParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let link = ProxyLink::from_params(params)?;
    let origin_url = link.resolve()?;
    super::check_origin(&state, &origin_url)?;

    info!("Serving key from origin: {}", origin_url);

    let response = fetch_with_retry(
        &state.http_client,
        &origin_url,
        &link.header_map()?,
        &state.retry_config(),
    )
    .await?;

    let bytes = response.bytes().await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(bytes),
    )
        .into_response())
}
