pub mod handlers;
pub mod state;
pub mod url_validation;

use crate::config::Config;
use axum::{
    http::{HeaderValue, header::HeaderName},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Stamp every response with the relay version.
async fn set_version_header(mut response: Response) -> Response {
    response.headers_mut().insert(
        HeaderName::from_static("x-relay-version"),
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Build the relay router with all routes and middleware.
pub fn build_router(config: Config) -> Router {
    let state = AppState::new(config);

    Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/proxify", get(handlers::manifest::proxify))
        .route("/single", get(handlers::playlist::handle_single))
        .route("/ts", get(handlers::segment::handle_segment))
        .route("/key", get(handlers::key::handle_key))
        .layer(middleware::map_response(set_version_header))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let app = build_router(config);

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Relay listening on http://{}", addr);

    // Start serving
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
