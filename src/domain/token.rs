//! Token and liquidity-source metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Address;

/// ERC-20 (or native) token metadata as published by the aggregator.
///
/// Immutable once fetched. The full list is replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Token {
    /// Token contract address (case-insensitive).
    #[schema(value_type = String)]
    pub address: Address,
    /// Ticker symbol, e.g. `"USDC"`.
    pub symbol: String,
    /// Human-readable name.
    pub name: String,
    /// Number of decimal places between atomic and human amounts.
    pub decimals: u8,
    /// Optional logo URL.
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

/// Token list keyed by address.
pub type TokenMap = HashMap<Address, Token>;

/// A liquidity source (DEX protocol) the aggregator can route through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Protocol {
    /// Stable protocol identifier, e.g. `"UNISWAP_V3"`.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}
