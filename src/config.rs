//! Configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The API key is the only required
//! value; it is never given a default and never printed.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::client::RetryPolicy;

/// Default upstream base URL. `{chain_id}` is substituted at construction.
pub const DEFAULT_BASE_URL: &str = "https://api.1inch.dev/swap/v6.0/{chain_id}";

/// Placeholder replaced by the chain id in [`ClientConfig::base_url_template`].
pub const CHAIN_ID_PLACEHOLDER: &str = "{chain_id}";

/// Settings for one [`crate::client::GatewayClient`] instance.
///
/// Resolved once at construction. One instance corresponds to one API key
/// and one pacing gate.
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every upstream request.
    pub api_key: String,

    /// EVM chain id, e.g. `1` for Ethereum mainnet.
    pub chain_id: u64,

    /// Base URL with a `{chain_id}` placeholder.
    pub base_url_template: String,

    /// Minimum spacing between two outbound requests.
    pub min_request_interval: Duration,

    /// Lifetime of cached token, protocol, and spender lookups.
    pub cache_ttl: Duration,

    /// Serve an expired cache entry when its refresh fails.
    pub serve_stale_on_error: bool,

    /// Per-request transport timeout.
    pub request_timeout: Duration,

    /// Retry behaviour for 429, 5xx, and transport failures.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Creates a configuration with default pacing, caching, and retry.
    #[must_use]
    pub fn new(api_key: impl Into<String>, chain_id: u64) -> Self {
        Self {
            api_key: api_key.into(),
            chain_id,
            base_url_template: DEFAULT_BASE_URL.to_string(),
            min_request_interval: Duration::from_millis(1_000),
            cache_ttl: Duration::from_millis(300_000),
            serve_stale_on_error: false,
            request_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }

    /// Loads client settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `ONEINCH_API_KEY` is missing or empty.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("ONEINCH_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or("ONEINCH_API_KEY must be set")?;

        let mut config = Self::new(api_key, parse_env("CHAIN_ID", 1));
        if let Ok(template) = std::env::var("ONEINCH_BASE_URL") {
            config.base_url_template = template;
        }
        config.min_request_interval =
            Duration::from_millis(parse_env("MIN_REQUEST_INTERVAL_MS", 1_000));
        config.cache_ttl = Duration::from_millis(parse_env("CACHE_TTL_MS", 300_000));
        config.serve_stale_on_error = parse_env_bool("SERVE_STALE_ON_ERROR", false);
        config.request_timeout = Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 15));
        Ok(config)
    }

    /// Returns the base URL with the chain id substituted and no trailing
    /// slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url_template
            .replace(CHAIN_ID_PLACEHOLDER, &self.chain_id.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("base_url_template", &self.base_url_template)
            .field("min_request_interval", &self.min_request_interval)
            .field("cache_ttl", &self.cache_ttl)
            .field("serve_stale_on_error", &self.serve_stale_on_error)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Top-level proxy configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Browser origin allowed by CORS (the local swap UI).
    pub cors_origin: String,

    /// Upstream client settings.
    pub client: ClientConfig,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`], or if the client settings are incomplete.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            listen_addr,
            cors_origin,
            client: ClientConfig::from_env()?,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}
