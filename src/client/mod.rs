//! Rate-limited, cached client for the aggregation API.
//!
//! [`GatewayClient`] is the only component that talks to the upstream. Every
//! outbound request goes through the same sequence:
//!
//! ```text
//! caller ─► validate ─► cache? ─► Pacer::acquire ─► Transport::get
//!                          ▲                              │
//!                          │        RetryPolicy::decide ◄─┘
//!                          └── store on success   (sleep + re-pace on retry)
//! ```
//!
//! The pacing gate and the caches are fields of the instance, so two clients
//! (for example one per API key) pace independently.

pub mod cache;
pub mod endpoint;
pub mod pacer;
pub mod retry;
pub mod transport;
mod wire;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

pub use cache::{CacheEntry, Served, StaleCacheServed, TtlCache};
pub use endpoint::Endpoint;
pub use pacer::Pacer;
pub use retry::{Decision, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

use crate::config::ClientConfig;
use crate::domain::quote::DEFAULT_SLIPPAGE_PERCENT;
use crate::domain::{
    Address, AtomicAmount, Protocol, Quote, QuoteOptions, SwapPlan, SwapTransaction, TokenMap,
};
use crate::error::ClientError;

const NO_PARAMS: &[(&str, &str)] = &[];

/// Gateway to the upstream aggregator for one API key and chain.
///
/// Safe to share between tasks behind an [`Arc`]: all outbound requests
/// funnel through one [`Pacer`], and cache slots are individually locked.
#[derive(Debug)]
pub struct GatewayClient {
    config: ClientConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
    pacer: Pacer,
    tokens: TtlCache<u64, Arc<TokenMap>>,
    protocols: TtlCache<u64, Arc<Vec<Protocol>>>,
    spender: TtlCache<u64, Address>,
}

impl GatewayClient {
    /// Creates a client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the API key is empty, the
    /// base URL is invalid, or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.request_timeout)
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client over an arbitrary [`Transport`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the API key is empty or
    /// the base URL is invalid.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Configuration("api key is empty".to_string()));
        }
        let base_url = config.base_url();
        Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("base url {base_url:?}: {e}")))?;

        let pacer = Pacer::new(config.min_request_interval);
        tracing::info!(
            %base_url,
            chain_id = config.chain_id,
            min_interval_ms = u64::try_from(pacer.min_interval().as_millis()).unwrap_or(u64::MAX),
            cache_ttl_s = config.cache_ttl.as_secs(),
            serve_stale = config.serve_stale_on_error,
            "gateway client ready"
        );

        Ok(Self {
            base_url,
            transport,
            pacer,
            tokens: TtlCache::new(config.cache_ttl),
            protocols: TtlCache::new(config.cache_ttl),
            spender: TtlCache::new(config.cache_ttl),
            config,
        })
    }

    /// Chain this client is bound to.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Age of the cached token list, if one is held.
    #[must_use]
    pub fn token_cache_age(&self) -> Option<Duration> {
        self.tokens.age(&self.config.chain_id)
    }

    /// Lists every token the aggregator supports on this chain.
    ///
    /// Served from cache while fresh; otherwise fetched with one paced
    /// request and stored whole.
    ///
    /// # Errors
    ///
    /// Returns the upstream or transport error when the list cannot be
    /// refreshed and no stale copy may be served.
    pub async fn list_tokens(&self) -> Result<Served<Arc<TokenMap>>, ClientError> {
        let chain_id = self.config.chain_id;
        let refresh = move || async move {
            let body = self.execute(Endpoint::Tokens, NO_PARAMS).await?.body;
            let tokens = wire::decode::<wire::TokensResponse>(&body)?.into_token_map();
            tracing::info!(chain_id, count = tokens.len(), "token list refreshed");
            Ok::<_, ClientError>(Arc::new(tokens))
        };
        self.tokens
            .get_or_refresh(&chain_id, self.config.serve_stale_on_error, refresh)
            .await
    }

    /// Lists the liquidity sources the aggregator can route through.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::list_tokens`].
    pub async fn list_protocols(&self) -> Result<Served<Arc<Vec<Protocol>>>, ClientError> {
        let refresh = move || async move {
            let body = self.execute(Endpoint::LiquiditySources, NO_PARAMS).await?.body;
            let sources = wire::decode::<wire::LiquiditySourcesResponse>(&body)?;
            Ok::<_, ClientError>(Arc::new(sources.protocols))
        };
        self.protocols
            .get_or_refresh(&self.config.chain_id, self.config.serve_stale_on_error, refresh)
            .await
    }

    /// Returns the router contract that approvals must authorize.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::list_tokens`].
    pub async fn get_spender(&self) -> Result<Served<Address>, ClientError> {
        let refresh = move || async move {
            let body = self.execute(Endpoint::Spender, NO_PARAMS).await?.body;
            Ok::<_, ClientError>(wire::decode::<wire::SpenderResponse>(&body)?.address)
        };
        self.spender
            .get_or_refresh(&self.config.chain_id, self.config.serve_stale_on_error, refresh)
            .await
    }

    /// Prices a swap of `amount` atomic units of `source` into `destination`.
    ///
    /// `slippage_percent` is validated but not sent; it only matters when
    /// the swap is built.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] without touching the
    /// network if an address is malformed, the tokens are equal, the
    /// amount is not a positive integer, or an option is out of range.
    /// Otherwise returns the upstream or transport error.
    pub async fn get_quote(
        &self,
        source: &str,
        destination: &str,
        amount: &str,
        options: &QuoteOptions,
    ) -> Result<Quote, ClientError> {
        let (source, destination, amount) = validate_pair(source, destination, amount, options)?;

        let mut params = vec![
            ("src", source.to_string()),
            ("dst", destination.to_string()),
            ("amount", amount.to_string()),
            ("includeProtocols", "true".to_string()),
            ("includeGas", "true".to_string()),
        ];
        push_route_options(&mut params, options);

        let body = self.execute(Endpoint::Quote, &params).await?.body;
        let quote =
            wire::decode::<wire::QuoteResponse>(&body)?.into_quote(source, destination, amount)?;
        tracing::info!(
            src = %quote.source,
            dst = %quote.destination,
            amount = %quote.source_amount,
            dst_amount = %quote.destination_amount,
            "quote received"
        );
        Ok(quote)
    }

    /// Builds an unsigned swap transaction sent from `from`.
    ///
    /// Uses 1 % slippage when `options.slippage_percent` is unset.
    ///
    /// # Errors
    ///
    /// Same validation as [`GatewayClient::get_quote`], plus
    /// [`ClientError::InvalidParameters`] for a malformed `from` address.
    pub async fn build_swap(
        &self,
        source: &str,
        destination: &str,
        amount: &str,
        from: &str,
        options: &QuoteOptions,
    ) -> Result<SwapPlan, ClientError> {
        let (source, destination, amount) = validate_pair(source, destination, amount, options)?;
        let from = Address::parse(from)?;
        let slippage = options.slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT);

        let mut params = vec![
            ("src", source.to_string()),
            ("dst", destination.to_string()),
            ("amount", amount.to_string()),
            ("from", from.to_string()),
            ("origin", from.to_string()),
            ("slippage", slippage.to_string()),
        ];
        push_route_options(&mut params, options);

        let body = self.execute(Endpoint::Swap, &params).await?.body;
        let plan = wire::decode::<wire::SwapResponse>(&body)?.into_plan()?;
        tracing::info!(
            src = %source,
            dst = %destination,
            %from,
            dst_amount = %plan.destination_amount,
            "swap transaction built"
        );
        Ok(plan)
    }

    /// Reads how much of `token` the router may currently spend for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] for malformed addresses,
    /// otherwise the upstream or transport error.
    pub async fn get_allowance(&self, token: &str, owner: &str) -> Result<AtomicAmount, ClientError> {
        let token = Address::parse(token)?;
        let owner = Address::parse(owner)?;
        let params = [
            ("tokenAddress", token.to_string()),
            ("walletAddress", owner.to_string()),
        ];
        let body = self.execute(Endpoint::Allowance, &params).await?.body;
        wire::decode::<wire::AllowanceResponse>(&body)?.into_amount()
    }

    /// Builds an approval transaction for `token`.
    ///
    /// With `amount` unset the parameter is left out of the request and the
    /// upstream approves an unlimited amount.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] for a malformed address or
    /// amount, otherwise the upstream or transport error.
    pub async fn build_approval(
        &self,
        token: &str,
        amount: Option<&str>,
    ) -> Result<SwapTransaction, ClientError> {
        let token = Address::parse(token)?;
        let mut params = vec![("tokenAddress", token.to_string())];
        if let Some(amount) = amount {
            params.push(("amount", AtomicAmount::parse(amount)?.to_string()));
        }
        let body = self.execute(Endpoint::ApproveTransaction, &params).await?.body;
        Ok(wire::decode::<wire::WireTransaction>(&body)?.into())
    }

    /// Drops the cached response for `endpoint` so the next read refetches.
    ///
    /// Returns `false` for endpoints that are never cached.
    pub async fn invalidate(&self, endpoint: Endpoint) -> bool {
        if !endpoint.is_cacheable() {
            return false;
        }
        let chain_id = self.config.chain_id;
        match endpoint {
            Endpoint::Tokens => self.tokens.invalidate(&chain_id).await,
            Endpoint::LiquiditySources => self.protocols.invalidate(&chain_id).await,
            Endpoint::Spender => self.spender.invalidate(&chain_id).await,
            Endpoint::Quote
            | Endpoint::Swap
            | Endpoint::Allowance
            | Endpoint::ApproveTransaction => return false,
        }
        tracing::info!(%endpoint, chain_id, "cache entry invalidated");
        true
    }

    /// Drops every cached response; returns the endpoints cleared.
    pub async fn invalidate_all(&self) -> Vec<Endpoint> {
        let mut cleared = Vec::new();
        for endpoint in Endpoint::ALL {
            if self.invalidate(endpoint).await {
                cleared.push(endpoint);
            }
        }
        cleared
    }

    /// Sends `query` to `endpoint` unchanged and returns the raw 2xx
    /// response, status included.
    ///
    /// Paced, authenticated, and retried like every other request, but not
    /// validated or cached.
    ///
    /// # Errors
    ///
    /// Returns the upstream or transport error after retries.
    pub async fn forward(
        &self,
        endpoint: Endpoint,
        query: &[(String, String)],
    ) -> Result<HttpResponse, ClientError> {
        self.execute(endpoint, query).await
    }

    async fn execute<K, V>(
        &self,
        endpoint: Endpoint,
        params: &[(K, V)],
    ) -> Result<HttpResponse, ClientError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        }
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let mut retries_done = 0;
        loop {
            self.pacer.acquire().await;
            tracing::debug!(%endpoint, attempt = retries_done + 1, "dispatching upstream request");

            let request = HttpRequest {
                url: url.clone(),
                headers: vec![
                    ("Authorization", format!("Bearer {}", self.config.api_key)),
                    ("Accept", "application/json".to_string()),
                ],
            };
            let outcome = self.transport.get(request).await;
            let status = outcome.as_ref().ok().map(|r| r.status);

            match self.config.retry.decide(outcome, retries_done) {
                Decision::Done(response) => return Ok(response),
                Decision::Retry(backoff) => {
                    tracing::warn!(
                        %endpoint,
                        ?status,
                        attempt = retries_done + 1,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "retryable upstream failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    retries_done += 1;
                }
                Decision::Fail(err) => {
                    tracing::warn!(%endpoint, ?status, error = %err, "upstream request failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Validates the arguments shared by quote and swap requests.
pub(crate) fn validate_pair(
    source: &str,
    destination: &str,
    amount: &str,
    options: &QuoteOptions,
) -> Result<(Address, Address, AtomicAmount), ClientError> {
    let source = Address::parse(source)?;
    let destination = Address::parse(destination)?;
    if source == destination {
        return Err(ClientError::InvalidParameters(
            "source and destination tokens must differ".to_string(),
        ));
    }
    let amount = AtomicAmount::parse_positive(amount)?;
    options.validate()?;
    Ok((source, destination, amount))
}

fn push_route_options(params: &mut Vec<(&'static str, String)>, options: &QuoteOptions) {
    if let Some(parts) = options.max_route_parts {
        params.push(("parts", parts.to_string()));
    }
    if let Some(fee) = options.fee_percent {
        params.push(("fee", fee.to_string()));
    }
}
