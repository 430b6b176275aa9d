//! REST API layer built on Axum.
//!
//! Six endpoints: add, query, save, load, stats, health. Authentication is
//! deliberately absent; the server is meant to sit behind trusted plumbing.

/// API error type mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and application state.
pub mod handlers;
/// Request and response data transfer objects.
pub mod models;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vecvault_core::config;

use handlers::AppState;

/// Builds the Axum router with all routes and middleware layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/add", post(handlers::add))
        .route("/query", post(handlers::query))
        .route("/save", post(handlers::save))
        .route("/load", post(handlers::load))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config::MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
