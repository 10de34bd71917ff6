//! Catalog DTOs: tokens, liquidity sources, and the approval spender.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Address, Protocol, Token, TokenMap};

/// Response for `GET /api/tokens`, in the upstream's own shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenListResponse {
    /// Tokens keyed by lowercase address.
    pub tokens: BTreeMap<String, Token>,
}

impl From<&TokenMap> for TokenListResponse {
    fn from(map: &TokenMap) -> Self {
        Self {
            tokens: map
                .iter()
                .map(|(address, token)| (address.to_string(), token.clone()))
                .collect(),
        }
    }
}

/// Response for `GET /api/protocols`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProtocolListResponse {
    /// Liquidity sources available for routing.
    pub protocols: Vec<Protocol>,
}

/// Response for `GET /api/approve/spender`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpenderResponse {
    /// Router contract that approvals must authorize.
    #[schema(value_type = String)]
    pub address: Address,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn token_keys_are_lowercase_addresses() {
        let Ok(address) = Address::parse("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48") else {
            panic!("valid address");
        };
        let mut map = TokenMap::new();
        map.insert(
            address.clone(),
            Token {
                address,
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                decimals: 6,
                logo_uri: None,
            },
        );

        let dto = TokenListResponse::from(&map);
        assert!(
            dto.tokens
                .contains_key("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
        );
    }
}
