//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Search and analysis
        .route("/search", post(handlers::search))
        .route("/search/:id", get(handlers::search_status))
        .route("/analyze", post(handlers::analyze))
        // Sharing
        .route("/share", post(handlers::share).delete(handlers::unshare))
        .route("/shared/:token", get(handlers::shared))
        // Per-user records
        .route("/history", get(handlers::history))
        .route("/history/:id", delete(handlers::delete_history))
        .route("/export", post(handlers::export_results))
        .route("/usage", get(handlers::usage))
        // Service
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        // Add middleware
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Add state
        .with_state(state)
}
