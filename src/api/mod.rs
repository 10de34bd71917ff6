//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api`. With the `swagger-ui` feature the
//! OpenAPI document is served at `/api-docs/openapi.json` and browsable at
//! `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::http::header::InvalidHeaderValue;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the proxy.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "aggregator-gateway",
        description = "Rate-limited, cached proxy in front of the 1inch aggregation API."
    ),
    paths(
        handlers::proxy::list_tokens,
        handlers::proxy::list_protocols,
        handlers::proxy::quote,
        handlers::proxy::swap,
        handlers::proxy::allowance,
        handlers::proxy::approve_transaction,
        handlers::proxy::spender,
        handlers::system::health_handler,
        handlers::system::invalidate_handler,
    ),
    components(schemas(
        dto::TokenListResponse,
        dto::ProtocolListResponse,
        dto::SpenderResponse,
        handlers::system::HealthResponse,
        handlers::system::InvalidateResponse,
        crate::domain::Token,
        crate::domain::Protocol,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Catalog", description = "Cached token and protocol lists"),
        (name = "Swaps", description = "Quotes and swap transactions"),
        (name = "Approvals", description = "Allowance and approval transactions"),
        (name = "System", description = "Health and cache control"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new().nest("/api", handlers::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// CORS policy admitting `GET` from a single browser origin.
///
/// # Errors
///
/// Returns [`InvalidHeaderValue`] if `origin` is not a valid header value.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET]))
}
