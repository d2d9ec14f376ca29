//! API routes definition

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Operational
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Registration
        .route("/api/client/register", post(handlers::register_client))
        .route("/api/users", post(handlers::register_user))
        // Collections
        .route(
            "/api/user/:nickname/followers",
            get(handlers::get_followers).options(handlers::collection_options),
        )
        .route(
            "/api/user/:nickname/following",
            get(handlers::get_following).options(handlers::collection_options),
        )
        // Feed
        .route("/api/user/:nickname/feed", post(handlers::post_to_feed))
        .with_state(state)
}
