//! Upstream JSON shapes and their normalization into domain types.
//!
//! Different API versions name the same field differently (`dstAmount`,
//! `toAmount`, `toTokenAmount`; `gas`, `estimatedGas`) and send numbers
//! either as JSON numbers or strings. Everything is folded into one shape
//! here so nothing outside this module sees the raw payloads.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    Address, AtomicAmount, Protocol, Quote, RouteStep, SwapPlan, SwapTransaction, Token, TokenMap,
};
use crate::error::ClientError;

/// Accepts `"123"` or `123` and yields the digits as a string.
mod string_or_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        })
    }

    pub(super) fn option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        }))
    }
}

/// Parses a 2xx body, mapping shape mismatches to [`ClientError::Decode`].
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

fn decode_amount(raw: &str) -> Result<AtomicAmount, ClientError> {
    AtomicAmount::parse(raw).map_err(|_| ClientError::Decode(format!("bad amount {raw:?}")))
}

#[derive(Debug, Deserialize)]
struct WireToken {
    address: String,
    symbol: String,
    name: String,
    decimals: u8,
    #[serde(rename = "logoURI", default)]
    logo_uri: Option<String>,
}

/// `GET /tokens`
#[derive(Debug, Deserialize)]
pub(crate) struct TokensResponse {
    tokens: HashMap<String, WireToken>,
}

impl TokensResponse {
    /// Keys the list by normalized address, skipping malformed entries.
    pub(crate) fn into_token_map(self) -> TokenMap {
        let mut map = TokenMap::with_capacity(self.tokens.len());
        for (key, wire) in self.tokens {
            let Ok(address) = Address::parse(&wire.address) else {
                tracing::warn!(token = %key, "skipping token with malformed address");
                continue;
            };
            map.insert(
                address.clone(),
                Token {
                    address,
                    symbol: wire.symbol,
                    name: wire.name,
                    decimals: wire.decimals,
                    logo_uri: wire.logo_uri,
                },
            );
        }
        map
    }
}

/// `GET /liquidity-sources`
#[derive(Debug, Deserialize)]
pub(crate) struct LiquiditySourcesResponse {
    pub(crate) protocols: Vec<Protocol>,
}

/// `GET /approve/spender`
#[derive(Debug, Deserialize)]
pub(crate) struct SpenderResponse {
    pub(crate) address: Address,
}

/// `GET /approve/allowance`
#[derive(Debug, Deserialize)]
pub(crate) struct AllowanceResponse {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    allowance: String,
}

impl AllowanceResponse {
    pub(crate) fn into_amount(self) -> Result<AtomicAmount, ClientError> {
        decode_amount(&self.allowance)
    }
}

/// `GET /quote`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteResponse {
    #[serde(alias = "toAmount", alias = "toTokenAmount", deserialize_with = "string_or_number::deserialize")]
    dst_amount: String,
    #[serde(default)]
    protocols: Value,
    #[serde(default, alias = "estimatedGas", deserialize_with = "string_or_number::option")]
    gas: Option<String>,
}

impl QuoteResponse {
    pub(crate) fn into_quote(
        self,
        source: Address,
        destination: Address,
        source_amount: AtomicAmount,
    ) -> Result<Quote, ClientError> {
        let mut route = Vec::new();
        flatten_route(&self.protocols, &mut route);
        Ok(Quote {
            source,
            destination,
            source_amount,
            destination_amount: decode_amount(&self.dst_amount)?,
            route,
            estimated_gas: self.gas.and_then(|g| g.parse().ok()),
        })
    }
}

/// Walks the nested route arrays in order and collects every hop object.
fn flatten_route(value: &Value, out: &mut Vec<RouteStep>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten_route(item, out)),
        Value::Object(hop) => {
            let text = |key: &str| {
                hop.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            out.push(RouteStep {
                protocol: text("name"),
                part: hop.get("part").and_then(Value::as_f64).unwrap_or(0.0),
                from_token: text("fromTokenAddress"),
                to_token: text("toTokenAddress"),
            });
        }
        _ => {}
    }
}

/// Transaction object inside `/swap` and the body of `/approve/transaction`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTransaction {
    #[serde(default)]
    from: Option<String>,
    to: String,
    data: String,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    value: String,
    #[serde(default, deserialize_with = "string_or_number::option")]
    gas: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    gas_price: String,
}

impl From<WireTransaction> for SwapTransaction {
    fn from(wire: WireTransaction) -> Self {
        Self {
            from: wire.from,
            to: wire.to,
            data: wire.data,
            value: wire.value,
            gas: wire.gas,
            gas_price: wire.gas_price,
        }
    }
}

/// `GET /swap`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SwapResponse {
    #[serde(alias = "toAmount", alias = "toTokenAmount", deserialize_with = "string_or_number::deserialize")]
    dst_amount: String,
    tx: WireTransaction,
}

impl SwapResponse {
    pub(crate) fn into_plan(self) -> Result<SwapPlan, ClientError> {
        Ok(SwapPlan {
            destination_amount: decode_amount(&self.dst_amount)?,
            transaction: self.tx.into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(raw: &str) -> Address {
        let Ok(a) = Address::parse(raw) else {
            panic!("valid address");
        };
        a
    }

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn quote_from(body: &str) -> Quote {
        let Ok(wire) = decode::<QuoteResponse>(body) else {
            panic!("decodable quote");
        };
        let Ok(amount) = AtomicAmount::parse("1000000000000000000") else {
            panic!("valid amount");
        };
        let Ok(quote) = wire.into_quote(addr(WETH), addr(USDC), amount) else {
            panic!("valid quote");
        };
        quote
    }

    #[test]
    fn dst_amount_is_kept_verbatim() {
        let quote = quote_from(r#"{"dstAmount":"3868650000"}"#);
        assert_eq!(quote.destination_amount.as_str(), "3868650000");
        assert!(quote.route.is_empty());
        assert_eq!(quote.estimated_gas, None);
    }

    #[test]
    fn legacy_field_names_are_normalized() {
        let v5 = quote_from(r#"{"toAmount":"42","estimatedGas":180000}"#);
        assert_eq!(v5.destination_amount.as_str(), "42");
        assert_eq!(v5.estimated_gas, Some(180_000));

        let v4 = quote_from(r#"{"toTokenAmount":"43","gas":"150000"}"#);
        assert_eq!(v4.destination_amount.as_str(), "43");
        assert_eq!(v4.estimated_gas, Some(150_000));
    }

    #[test]
    fn nested_route_is_flattened_in_order() {
        let quote = quote_from(
            r#"{
                "dstAmount": "1",
                "protocols": [[
                    [{"name":"UNISWAP_V3","part":60,"fromTokenAddress":"0xa","toTokenAddress":"0xb"},
                     {"name":"CURVE","part":40,"fromTokenAddress":"0xa","toTokenAddress":"0xb"}],
                    [{"name":"SUSHI","part":100,"fromTokenAddress":"0xb","toTokenAddress":"0xc"}]
                ]]
            }"#,
        );
        let names: Vec<&str> = quote.route.iter().map(|s| s.protocol.as_str()).collect();
        assert_eq!(names, vec!["UNISWAP_V3", "CURVE", "SUSHI"]);
        assert!(quote.route.iter().map(|s| s.part).sum::<f64>() > 199.0);
    }

    #[test]
    fn missing_amount_is_a_decode_error() {
        let result = decode::<QuoteResponse>(r#"{"protocols":[]}"#);
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn token_map_is_keyed_case_insensitively() {
        let Ok(wire) = decode::<TokensResponse>(
            r#"{"tokens":{
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48":{
                    "address":"0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                    "symbol":"USDC","name":"USD Coin","decimals":6,
                    "logoURI":"https://tokens.1inch.io/usdc.png","tags":["tokens"]},
                "bogus":{"address":"bogus","symbol":"X","name":"X","decimals":0}
            }}"#,
        ) else {
            panic!("decodable tokens");
        };
        let map = wire.into_token_map();
        assert_eq!(map.len(), 1);
        let Some(usdc) = map.get(&addr(USDC)) else {
            panic!("usdc present");
        };
        assert_eq!(usdc.decimals, 6);
        assert_eq!(usdc.logo_uri.as_deref(), Some("https://tokens.1inch.io/usdc.png"));
    }

    #[test]
    fn swap_transaction_accepts_numeric_gas() {
        let Ok(wire) = decode::<SwapResponse>(
            r#"{"dstAmount":"99","tx":{"from":"0x1","to":"0x2","data":"0xdead",
                "value":"0","gas":210000,"gasPrice":"30000000000"}}"#,
        ) else {
            panic!("decodable swap");
        };
        let Ok(plan) = wire.into_plan() else {
            panic!("valid plan");
        };
        assert_eq!(plan.destination_amount.as_str(), "99");
        assert_eq!(plan.transaction.gas.as_deref(), Some("210000"));
        assert_eq!(plan.transaction.gas_price, "30000000000");
    }

    #[test]
    fn approval_transaction_has_no_gas() {
        let Ok(wire) = decode::<WireTransaction>(
            r#"{"data":"0x095ea7b3","gasPrice":"1","to":"0x3","value":"0"}"#,
        ) else {
            panic!("decodable approval");
        };
        let tx = SwapTransaction::from(wire);
        assert_eq!(tx.gas, None);
        assert_eq!(tx.from, None);
    }

    #[test]
    fn allowance_accepts_unlimited_value() {
        let Ok(wire) = decode::<AllowanceResponse>(
            r#"{"allowance":"115792089237316195423570985008687907853269984665640564039457584007913129639935"}"#,
        ) else {
            panic!("decodable allowance");
        };
        let Ok(amount) = wire.into_amount() else {
            panic!("valid amount");
        };
        assert!(!amount.is_zero());
    }
}
