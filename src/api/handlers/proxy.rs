//! Proxy endpoints in front of the aggregator.
//!
//! Catalog reads (`/tokens`, `/protocols`, `/approve/spender`) are served
//! from the client's caches. Everything else forwards the caller's query
//! parameters verbatim and relays the upstream JSON body.

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ProtocolListResponse, SpenderResponse, TokenListResponse};
use crate::app_state::AppState;
use crate::client::{Endpoint, StaleCacheServed};
use crate::error::{ErrorResponse, GatewayError, relayed_content_type};

/// Raw query parameters in arrival order.
type RawQuery = Query<Vec<(String, String)>>;

const STALE_WARNING: &str = "110 - \"Response is Stale\"";

fn mark_stale(response: &mut Response, endpoint: Endpoint, stale: Option<&StaleCacheServed>) {
    let Some(stale) = stale else {
        return;
    };
    tracing::warn!(
        %endpoint,
        age_ms = u64::try_from(stale.age.as_millis()).unwrap_or(u64::MAX),
        cause = %stale.cause,
        "serving stale cache entry"
    );
    response
        .headers_mut()
        .insert(header::WARNING, HeaderValue::from_static(STALE_WARNING));
}

async fn relay(
    state: &AppState,
    endpoint: Endpoint,
    query: &[(String, String)],
) -> Result<Response, GatewayError> {
    tracing::debug!(%endpoint, params = query.len(), "forwarding request");
    let upstream = state.client.forward(endpoint, query).await?;
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    let content_type = relayed_content_type(&upstream.body);
    Ok((status, [(header::CONTENT_TYPE, content_type)], upstream.body).into_response())
}

/// `GET /api/tokens`: Token list from cache.
///
/// # Errors
///
/// Returns [`GatewayError`] if the list cannot be fetched and no stale copy
/// may be served.
#[utoipa::path(
    get,
    path = "/api/tokens",
    tag = "Catalog",
    summary = "List tokens",
    description = "Returns every token supported on the configured chain. Served from cache while fresh.",
    responses(
        (status = 200, description = "Token list", body = TokenListResponse),
        (status = 429, description = "Upstream rate limit persisted", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn list_tokens(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let served = state.client.list_tokens().await?;
    let mut response = Json(TokenListResponse::from(served.value.as_ref())).into_response();
    mark_stale(&mut response, Endpoint::Tokens, served.stale.as_ref());
    Ok(response)
}

/// `GET /api/protocols`: Liquidity sources from cache.
///
/// # Errors
///
/// Same as [`list_tokens`].
#[utoipa::path(
    get,
    path = "/api/protocols",
    tag = "Catalog",
    summary = "List liquidity sources",
    description = "Returns the protocols the aggregator can route through. Served from cache while fresh.",
    responses(
        (status = 200, description = "Liquidity sources", body = ProtocolListResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn list_protocols(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let served = state.client.list_protocols().await?;
    let mut response = Json(ProtocolListResponse {
        protocols: served.value.as_ref().clone(),
    })
    .into_response();
    mark_stale(&mut response, Endpoint::LiquiditySources, served.stale.as_ref());
    Ok(response)
}

/// `GET /api/approve/spender`: Router address from cache.
///
/// # Errors
///
/// Same as [`list_tokens`].
#[utoipa::path(
    get,
    path = "/api/approve/spender",
    tag = "Approvals",
    summary = "Approval spender",
    description = "Returns the router contract that token approvals must authorize.",
    responses(
        (status = 200, description = "Spender address", body = SpenderResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn spender(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let served = state.client.get_spender().await?;
    let mut response = Json(SpenderResponse {
        address: served.value,
    })
    .into_response();
    mark_stale(&mut response, Endpoint::Spender, served.stale.as_ref());
    Ok(response)
}

/// `GET /api/quote`: Forwarded quote.
///
/// # Errors
///
/// Relays upstream errors with their status and body.
#[utoipa::path(
    get,
    path = "/api/quote",
    tag = "Swaps",
    summary = "Get a quote",
    description = "Forwards the query to the upstream quote endpoint and relays its JSON body.",
    params(
        ("src" = String, Query, description = "Source token address"),
        ("dst" = String, Query, description = "Destination token address"),
        ("amount" = String, Query, description = "Amount in atomic units"),
    ),
    responses(
        (status = 200, description = "Upstream quote, relayed verbatim"),
        (status = 400, description = "Rejected by upstream"),
        (status = 429, description = "Upstream rate limit persisted", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    Query(query): RawQuery,
) -> Result<Response, GatewayError> {
    relay(&state, Endpoint::Quote, &query).await
}

/// `GET /api/swap`: Forwarded swap build.
///
/// # Errors
///
/// Relays upstream errors with their status and body.
#[utoipa::path(
    get,
    path = "/api/swap",
    tag = "Swaps",
    summary = "Build a swap transaction",
    description = "Forwards the query to the upstream swap endpoint and relays the unsigned transaction.",
    params(
        ("src" = String, Query, description = "Source token address"),
        ("dst" = String, Query, description = "Destination token address"),
        ("amount" = String, Query, description = "Amount in atomic units"),
        ("from" = String, Query, description = "Sender address"),
        ("slippage" = f64, Query, description = "Slippage tolerance in percent"),
    ),
    responses(
        (status = 200, description = "Upstream swap, relayed verbatim"),
        (status = 400, description = "Rejected by upstream"),
        (status = 429, description = "Upstream rate limit persisted", body = ErrorResponse),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn swap(
    State(state): State<AppState>,
    Query(query): RawQuery,
) -> Result<Response, GatewayError> {
    relay(&state, Endpoint::Swap, &query).await
}

/// `GET /api/approve/allowance`: Forwarded allowance read.
///
/// # Errors
///
/// Relays upstream errors with their status and body.
#[utoipa::path(
    get,
    path = "/api/approve/allowance",
    tag = "Approvals",
    summary = "Read allowance",
    description = "Forwards the query to the upstream allowance endpoint. Never cached.",
    params(
        ("tokenAddress" = String, Query, description = "Token address"),
        ("walletAddress" = String, Query, description = "Owner address"),
    ),
    responses(
        (status = 200, description = "Upstream allowance, relayed verbatim"),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn allowance(
    State(state): State<AppState>,
    Query(query): RawQuery,
) -> Result<Response, GatewayError> {
    relay(&state, Endpoint::Allowance, &query).await
}

/// `GET /api/approve/transaction`: Forwarded approval build.
///
/// # Errors
///
/// Relays upstream errors with their status and body.
#[utoipa::path(
    get,
    path = "/api/approve/transaction",
    tag = "Approvals",
    summary = "Build an approval transaction",
    description = "Forwards the query to the upstream approval endpoint. Omitting `amount` approves an unlimited amount.",
    params(
        ("tokenAddress" = String, Query, description = "Token address"),
        ("amount" = Option<String>, Query, description = "Amount in atomic units"),
    ),
    responses(
        (status = 200, description = "Upstream approval transaction, relayed verbatim"),
        (status = 502, description = "Upstream unreachable", body = ErrorResponse),
    )
)]
pub async fn approve_transaction(
    State(state): State<AppState>,
    Query(query): RawQuery,
) -> Result<Response, GatewayError> {
    relay(&state, Endpoint::ApproveTransaction, &query).await
}

/// Proxy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", get(list_tokens))
        .route("/protocols", get(list_protocols))
        .route("/quote", get(quote))
        .route("/swap", get(swap))
        .route("/approve/allowance", get(allowance))
        .route("/approve/transaction", get(approve_transaction))
        .route("/approve/spender", get(spender))
}
