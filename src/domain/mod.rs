//! Domain layer: the typed values callers exchange with the gateway.
//!
//! Addresses and amounts are validated newtypes so that malformed input is
//! rejected before any request leaves the process. Amounts stay in atomic
//! units; unit conversion is offered as a helper but never applied to
//! upstream results.

pub mod address;
pub mod amount;
pub mod quote;
pub mod token;
pub mod transaction;

pub use address::{Address, NATIVE_TOKEN};
pub use amount::{AtomicAmount, format_units, parse_units};
pub use quote::{Quote, QuoteOptions, RouteStep};
pub use token::{Protocol, Token, TokenMap};
pub use transaction::{SwapPlan, SwapTransaction, TxHash};
