//! Service layer: flows built on top of the gateway client.
//!
//! [`SwapService`] coordinates token lookup, allowance, approval, and swap,
//! delegating signing to a [`TransactionSigner`].

pub mod signer;
pub mod swap_service;

pub use signer::TransactionSigner;
pub use swap_service::{QuoteView, SwapIntent, SwapReceipt, SwapService};
