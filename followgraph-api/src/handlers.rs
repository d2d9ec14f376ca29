//! HTTP API handlers

use super::auth::OAuthCredentials;
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use super::types::*;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use followgraph_core::core_access::ClientRegistration;
use followgraph_core::core_follow::{Activity, ActivityRequest, ALLOWED_COLLECTION_METHODS};
use followgraph_core::{Collection, CollectionKind, GraphError};
use std::sync::Arc;

// ============================================================================
// Operational
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/client/register - associate a client application
pub async fn register_client(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterClientRequest>, JsonRejection>,
) -> ApiResult<Json<ClientRegistration>> {
    let Json(req) = body?;
    if req.registration_type != CLIENT_ASSOCIATE {
        return Err(GraphError::BadRequest(format!(
            "Unsupported registration type: {}",
            req.registration_type
        ))
        .into());
    }

    Ok(Json(state.registry.register_client(req.application_name).await))
}

/// POST /api/users - register an actor; requires client credentials
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    OAuthCredentials(credentials): OAuthCredentials,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<Json<RegisterUserResponse>> {
    let caller = state.authorize(credentials.as_ref()).await?;
    let Json(req) = body?;

    let (actor, pair) = state
        .registry
        .register_account(
            caller.client_id(),
            &req.nickname,
            &req.password,
            req.display_name.as_deref(),
        )
        .await?;

    Ok(Json(RegisterUserResponse {
        nickname: actor.nickname.clone(),
        profile: actor.to_person(),
        token: pair.token,
        token_secret: pair.token_secret,
    }))
}

// ============================================================================
// Collections
// ============================================================================

async fn collection(
    state: &AppState,
    kind: CollectionKind,
    nickname: &str,
    credentials: Option<&followgraph_core::Credentials>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Collection>> {
    let caller = state.authorize(credentials).await?;
    let Query(query) =
        query.map_err(|rejection| GraphError::BadRequest(rejection.body_text()))?;
    let page = state
        .service
        .pagination()
        .parse_request(query.offset.as_deref(), query.count.as_deref())?;
    let collection = state.service.collection(kind, nickname, &caller, page).await?;
    Ok(Json(collection))
}

/// GET /api/user/:nickname/followers
pub async fn get_followers(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
    OAuthCredentials(credentials): OAuthCredentials,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Collection>> {
    collection(&state, CollectionKind::Followers, &nickname, credentials.as_ref(), query).await
}

/// GET /api/user/:nickname/following
pub async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
    OAuthCredentials(credentials): OAuthCredentials,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Collection>> {
    collection(&state, CollectionKind::Following, &nickname, credentials.as_ref(), query).await
}

/// OPTIONS on either collection; no credentials, no store access
pub async fn collection_options() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::ALLOW, ALLOWED_COLLECTION_METHODS.join(", "))],
    )
}

// ============================================================================
// Feed
// ============================================================================

/// POST /api/user/:nickname/feed - follow activity
pub async fn post_to_feed(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
    OAuthCredentials(credentials): OAuthCredentials,
    body: Result<Json<ActivityRequest>, JsonRejection>,
) -> ApiResult<Json<Activity>> {
    let caller = state.authorize(credentials.as_ref()).await?;
    caller.require_actor()?;
    let Json(request) = body.map_err(ApiError::from)?;

    let activity = state
        .service
        .post_activity(&caller, &nickname, &request)
        .await?;
    Ok(Json(activity))
}
