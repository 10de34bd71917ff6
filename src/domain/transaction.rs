//! Unsigned transaction descriptors produced by the aggregator.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AtomicAmount;

/// Unsigned transaction ready to be handed to a wallet for signing.
///
/// Produced per request and consumed once. Calldata and gas price are only
/// valid against current chain state, so these are never cached or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    /// Sender, when the upstream echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Contract to call.
    pub to: String,
    /// Opaque ABI-encoded calldata.
    pub data: String,
    /// Native value to attach, in wei.
    pub value: String,
    /// Gas limit. Absent for approval transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    /// Gas price in wei.
    pub gas_price: String,
}

/// Result of building a swap: the expected output plus the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPlan {
    /// Output amount the route is expected to deliver.
    pub destination_amount: AtomicAmount,
    /// Transaction to sign.
    pub transaction: SwapTransaction,
}

/// Hash of a broadcast transaction as reported by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
