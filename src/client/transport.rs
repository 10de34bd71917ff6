//! HTTP transport seam.
//!
//! [`GatewayClient`](super::GatewayClient) only needs "send this GET with
//! these headers and give me status, body, and `Retry-After`". Keeping that
//! behind [`Transport`] lets tests script the upstream without a socket.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::RETRY_AFTER;

/// An outbound GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Fully built URL including the query string.
    pub url: Url,
    /// Extra headers, e.g. `Authorization`.
    pub headers: Vec<(&'static str, String)>,
}

/// A received response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
    /// Parsed `Retry-After` header (delta-seconds form only).
    pub retry_after: Option<Duration>,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Minimal asynchronous HTTP client.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aggregator-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted upstream for tests.

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::{HttpRequest, HttpResponse, Transport, TransportError};

    /// One scripted answer.
    #[derive(Debug, Clone)]
    pub(crate) struct MockReply {
        result: Result<HttpResponse, TransportError>,
        delay: Option<Duration>,
    }

    impl MockReply {
        pub(crate) fn status(status: u16, body: &str) -> Self {
            Self {
                result: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                    retry_after: None,
                }),
                delay: None,
            }
        }

        pub(crate) fn ok(body: &str) -> Self {
            Self::status(200, body)
        }

        pub(crate) fn network(message: &str) -> Self {
            Self {
                result: Err(TransportError(message.to_string())),
                delay: None,
            }
        }

        pub(crate) fn retry_after(mut self, after: Duration) -> Self {
            if let Ok(response) = &mut self.result {
                response.retry_after = Some(after);
            }
            self
        }

        pub(crate) fn after(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    /// A request as the mock saw it.
    #[derive(Debug, Clone)]
    pub(crate) struct RecordedRequest {
        pub(crate) request: HttpRequest,
        pub(crate) at: Instant,
    }

    impl RecordedRequest {
        pub(crate) fn query(&self, key: &str) -> Option<String> {
            self.request
                .url
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        }

        pub(crate) fn header(&self, name: &str) -> Option<&str> {
            self.request
                .headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Answers by path suffix. The last reply of each route repeats.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        routes: Mutex<HashMap<&'static str, VecDeque<MockReply>>>,
        calls: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn route(self, path: &'static str, replies: Vec<MockReply>) -> Self {
            self.routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path, replies.into());
            self
        }

        pub(crate) fn calls(&self) -> Vec<RecordedRequest> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        pub(crate) fn calls_to(&self, path: &str) -> Vec<RecordedRequest> {
            self.calls()
                .into_iter()
                .filter(|c| c.request.url.path().ends_with(path))
                .collect()
        }

        fn next_reply(&self, path: &str) -> MockReply {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            let matched = routes
                .iter_mut()
                .filter(|(suffix, _)| path.ends_with(*suffix))
                .max_by_key(|(suffix, _)| suffix.len())
                .map(|(_, queue)| queue);
            let Some(queue) = matched else {
                return MockReply::status(404, "{\"error\":\"no route\"}");
            };
            if queue.len() > 1 {
                queue.pop_front().unwrap_or_else(|| MockReply::status(500, ""))
            } else {
                queue
                    .front()
                    .cloned()
                    .unwrap_or_else(|| MockReply::status(500, ""))
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let reply = self.next_reply(request.url.path());
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedRequest {
                    request,
                    at: Instant::now(),
                });
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            reply.result
        }
    }
}
