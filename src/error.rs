//! Error types for the gateway client, the swap flow, and the proxy.
//!
//! [`ClientError`] is what every [`crate::client::GatewayClient`] operation
//! returns. [`GatewayError`] is the proxy's view of the same failures, with
//! an HTTP status code and a structured JSON body for each variant.

use std::time::Duration;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Failure of a gateway client operation.
///
/// Validation failures never reach the network. Transport failures and 5xx
/// responses are retried before they surface here; other 4xx responses are
/// surfaced immediately.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Local validation failed; no request was sent.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The upstream kept answering 429 after every retry.
    #[error("rate limited by upstream after {attempts} attempts")]
    RateLimited {
        /// Number of requests sent, including the first one.
        attempts: u32,
        /// Last `Retry-After` hint from the upstream, if any.
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx response. The body is opaque diagnostic text.
    #[error("upstream returned {status}: {body}")]
    UpstreamError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Transport-level failure: timeout, DNS, connection reset.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A 2xx body did not have the documented shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// The client could not be built from its configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Error from the wallet collaborator that signs and broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("signer error: {0}")]
pub struct SignerError(pub String);

/// Failure of the end-to-end swap flow in [`crate::service::SwapService`].
#[derive(Debug, thiserror::Error)]
pub enum SwapFlowError {
    /// A gateway call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The token is not in the aggregator's token list for this chain.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// The wallet refused or failed to sign or broadcast.
    #[error(transparent)]
    Signer(#[from] SignerError),
}

/// Structured JSON error response body.
///
/// All locally generated error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: amount must be greater than zero"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Proxy-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 3000–3999 | Server     | 500 / 502                 |
/// | 429       | Rate limit | 429 Too Many Requests     |
///
/// Upstream errors are relayed with the upstream status and body untouched.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream rate limit still in force after retries.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Non-2xx upstream answer relayed to the caller.
    #[error("upstream returned {status}")]
    Upstream {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream body, relayed verbatim.
        body: String,
    },

    /// The upstream could not be reached or answered garbage.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::RateLimited { .. } => 429,
            Self::Upstream { .. } => 3003,
            Self::BadGateway(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidParameters(msg) => Self::InvalidRequest(msg),
            ClientError::RateLimited { retry_after, .. } => Self::RateLimited {
                retry_after_ms: retry_after
                    .map_or(1_000, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            },
            ClientError::UpstreamError { status, body } => Self::Upstream { status, body },
            ClientError::NetworkError(msg) | ClientError::Decode(msg) => Self::BadGateway(msg),
            ClientError::Configuration(msg) => Self::Internal(msg),
        }
    }
}

/// Content type for a relayed upstream body: JSON if it parses, else text.
pub(crate) fn relayed_content_type(body: &str) -> &'static str {
    if serde_json::from_str::<serde::de::IgnoredAny>(body).is_ok() {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Upstream { body, .. } = self {
            let content_type = relayed_content_type(&body);
            return (status, [(header::CONTENT_TYPE, content_type)], body).into_response();
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
