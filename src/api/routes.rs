//! API Routes
//!
//! Configures the Axum router over both caches.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    contains_handler, delete_media_handler, delete_value_handler, get_value_handler,
    get_variant_handler, health_handler, media_size_handler, put_value_handler,
    put_variant_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|PUT|DELETE /cache/:key` - Generic cache entry
/// - `GET /cache/:key/exists` - Generic cache membership
/// - `GET|PUT /media/:category/:id/:state/:width[/:height]` - Media variant bytes
/// - `DELETE /media/:category/:id` - Drop every variant of a media item
/// - `GET /media/:category/:id/size` - Total cached bytes of a media item
/// - `GET /stats` - Store counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:key",
            get(get_value_handler)
                .put(put_value_handler)
                .delete(delete_value_handler),
        )
        .route("/cache/:key/exists", get(contains_handler))
        .route("/media/:category/:id", delete(delete_media_handler))
        .route("/media/:category/:id/size", get(media_size_handler))
        .route(
            "/media/:category/:id/:state/:width",
            get(get_variant_handler).put(put_variant_handler),
        )
        .route(
            "/media/:category/:id/:state/:width/:height",
            get(get_variant_handler).put(put_variant_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
