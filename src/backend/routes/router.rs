/**
 * Router Configuration
 *
 * Combines the socket endpoint, the REST API and the health check into one
 * Axum router.
 *
 * # Layers
 *
 * - `TraceLayer` logs each request through `tracing`
 * - `CorsLayer::permissive` lets browser clients on other origins connect
 */

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::chat::socket_handler;
use crate::backend::messaging::handlers::health;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// - `GET /health` - liveness check
/// - `GET /socket` - WebSocket upgrade (token in `Authorization` or `?token=`)
/// - `/api/chat/...` - conversation REST API
pub fn create_router(app_state: AppState) -> Router<()> {
    let api = configure_api_routes(&app_state);

    Router::new()
        .route("/health", get(health))
        .route("/socket", get(socket_handler))
        .nest("/api/chat", api)
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
