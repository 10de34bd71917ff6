//! Quote results and routing options.

use serde::Serialize;

use super::{Address, AtomicAmount};
use crate::error::ClientError;

/// Largest slippage tolerance the aggregator accepts, in percent.
pub const MAX_SLIPPAGE_PERCENT: f64 = 50.0;

/// Largest integrator fee the aggregator accepts, in percent.
pub const MAX_FEE_PERCENT: f64 = 3.0;

/// Largest number of route parts the aggregator accepts.
pub const MAX_ROUTE_PARTS: u32 = 100;

/// Slippage used by `build_swap` when the caller does not pick one.
pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 1.0;

/// Optional routing knobs shared by quote and swap requests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuoteOptions {
    /// Maximum adverse price movement, in percent, within `(0, 50]`.
    pub slippage_percent: Option<f64>,
    /// Upper bound on the number of split parts, within `1..=100`.
    pub max_route_parts: Option<u32>,
    /// Integrator fee in percent, within `[0, 3]`.
    pub fee_percent: Option<f64>,
}

impl QuoteOptions {
    /// Checks every provided option against the upstream limits.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] naming the first option
    /// that is out of range.
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Some(slippage) = self.slippage_percent
            && !(slippage > 0.0 && slippage <= MAX_SLIPPAGE_PERCENT)
        {
            return Err(ClientError::InvalidParameters(format!(
                "slippage {slippage} must be in (0, {MAX_SLIPPAGE_PERCENT}]"
            )));
        }
        if let Some(parts) = self.max_route_parts
            && !(1..=MAX_ROUTE_PARTS).contains(&parts)
        {
            return Err(ClientError::InvalidParameters(format!(
                "max route parts {parts} must be in 1..={MAX_ROUTE_PARTS}"
            )));
        }
        if let Some(fee) = self.fee_percent
            && !(0.0..=MAX_FEE_PERCENT).contains(&fee)
        {
            return Err(ClientError::InvalidParameters(format!(
                "fee {fee} must be in [0, {MAX_FEE_PERCENT}]"
            )));
        }
        Ok(())
    }
}

/// One hop of a route: a share of the amount sent through one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    /// Protocol identifier, e.g. `"UNISWAP_V3"`.
    pub protocol: String,
    /// Percentage of the amount routed through this step.
    pub part: f64,
    /// Token entering the step.
    pub from_token: String,
    /// Token leaving the step.
    pub to_token: String,
}

/// Pricing result for a source/destination pair at one instant.
///
/// Never cached: upstream prices move continuously.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Token being sold.
    pub source: Address,
    /// Token being bought.
    pub destination: Address,
    /// Input amount as supplied by the caller.
    pub source_amount: AtomicAmount,
    /// Output amount computed upstream, unconverted.
    pub destination_amount: AtomicAmount,
    /// Flattened route in upstream order.
    pub route: Vec<RouteStep>,
    /// Upstream gas estimate, when returned.
    pub estimated_gas: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(QuoteOptions::default().validate().is_ok());
    }

    #[test]
    fn slippage_bounds() {
        let at_max = QuoteOptions {
            slippage_percent: Some(50.0),
            ..QuoteOptions::default()
        };
        assert!(at_max.validate().is_ok());

        for bad in [0.0, -1.0, 50.5, f64::NAN] {
            let opts = QuoteOptions {
                slippage_percent: Some(bad),
                ..QuoteOptions::default()
            };
            assert!(opts.validate().is_err(), "slippage {bad} accepted");
        }
    }

    #[test]
    fn fee_and_parts_bounds() {
        let fee = QuoteOptions {
            fee_percent: Some(3.5),
            ..QuoteOptions::default()
        };
        assert!(fee.validate().is_err());

        let parts = QuoteOptions {
            max_route_parts: Some(0),
            ..QuoteOptions::default()
        };
        assert!(parts.validate().is_err());

        let ok = QuoteOptions {
            slippage_percent: Some(1.0),
            max_route_parts: Some(50),
            fee_percent: Some(0.0),
        };
        assert!(ok.validate().is_ok());
    }
}
