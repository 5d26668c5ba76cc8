use crate::{
    error::Result,
    proxy::link::{LinkParams, ProxyLink},
    proxy::manifest::build_manifest,
    server::state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use super::manifest::HLS_CONTENT_TYPE;

/// Serve a sub-playlist behind a proxy link.
///
/// Recursive case: the resolved playlist goes through the full
/// fetch+parse+rewrite pipeline again, so nested playlists come back
/// rewritten too.
pub async fn handle_single(
    Query(params): Query<LinkParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let link = ProxyLink::from_params(params)?;
    let origin_url = link.resolve()?;
    super::check_origin(&state, &origin_url)?;

    info!("Serving sub-playlist from origin: {}", origin_url);

    let body = build_manifest(
        &state.http_client,
        &state.retry_config(),
        &origin_url,
        &link.headers,
    )
    .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, HLS_CONTENT_TYPE)],
        body,
    )
        .into_response())
}
