//! Upstream resources reachable through the gateway.

use std::fmt;

/// A fixed upstream endpoint, relative to the chain-specific base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /tokens`
    Tokens,
    /// `GET /liquidity-sources`
    LiquiditySources,
    /// `GET /quote`
    Quote,
    /// `GET /swap`
    Swap,
    /// `GET /approve/allowance`
    Allowance,
    /// `GET /approve/transaction`
    ApproveTransaction,
    /// `GET /approve/spender`
    Spender,
}

impl Endpoint {
    /// Every endpoint, in path order.
    pub const ALL: [Self; 7] = [
        Self::Tokens,
        Self::LiquiditySources,
        Self::Quote,
        Self::Swap,
        Self::Allowance,
        Self::ApproveTransaction,
        Self::Spender,
    ];

    /// Path appended to the base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Tokens => "/tokens",
            Self::LiquiditySources => "/liquidity-sources",
            Self::Quote => "/quote",
            Self::Swap => "/swap",
            Self::Allowance => "/approve/allowance",
            Self::ApproveTransaction => "/approve/transaction",
            Self::Spender => "/approve/spender",
        }
    }

    /// Whether responses from this endpoint may be cached.
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Tokens | Self::LiquiditySources | Self::Spender)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
