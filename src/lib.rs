//! # aggregator-gateway
//!
//! Rate-limited, cached client and local REST proxy for the 1inch
//! aggregation API.
//!
//! The upstream allows roughly one request per second per key. Every call
//! made through a [`client::GatewayClient`] is paced to respect that,
//! retried with backoff on 429 and 5xx, and (for the token list, protocol
//! list, and approval spender) cached with a TTL.
//!
//! ## Architecture
//!
//! ```text
//! Browser UI / bot
//!     │
//!     ├── REST proxy (api/)          SwapService (service/)
//!     │        │                          │        └── TransactionSigner
//!     │        └──────────┬───────────────┘
//!     │                   │
//!     ├── GatewayClient (client/)
//!     │     ├── TtlCache   tokens, protocols, spender
//!     │     ├── Pacer      min interval between dispatches
//!     │     ├── RetryPolicy
//!     │     └── Transport  (reqwest)
//!     │
//!     └── 1inch aggregation API
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
