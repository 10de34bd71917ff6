//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Chain the gateway is bound to.
    pub chain_id: u64,
    /// Age of the cached token list in milliseconds, if one is held.
    pub token_cache_age_ms: Option<u64>,
}

/// `GET /api/health`: Service health status.
///
/// Answered locally; never touches the upstream or the pacing gate.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, chain, and token cache age.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let token_cache_age_ms = state
        .client
        .token_cache_age()
        .map(|age| u64::try_from(age.as_millis()).unwrap_or(u64::MAX));
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            chain_id: state.client.chain_id(),
            token_cache_age_ms,
        }),
    )
}

/// Cache invalidation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct InvalidateResponse {
    /// Upstream paths whose cached responses were dropped.
    pub cleared: Vec<String>,
}

/// `POST /api/cache/invalidate`: Drop cached catalog responses.
///
/// The next read of each catalog refetches from the upstream.
#[utoipa::path(
    post,
    path = "/api/cache/invalidate",
    tag = "System",
    summary = "Invalidate caches",
    description = "Drops the cached token list, liquidity sources, and approval spender.",
    responses(
        (status = 200, description = "Caches cleared", body = InvalidateResponse),
    )
)]
pub async fn invalidate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cleared = state
        .client
        .invalidate_all()
        .await
        .into_iter()
        .map(|endpoint| endpoint.path().to_string())
        .collect();
    (StatusCode::OK, Json(InvalidateResponse { cleared }))
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/invalidate", post(invalidate_handler))
}
