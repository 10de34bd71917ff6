//! Wallet collaborator seam.
//!
//! The gateway never holds keys. Whatever owns them (a browser wallet bridge,
//! a hardware signer, a bot's keystore) implements [`TransactionSigner`] and
//! reports back the hash of the broadcast transaction.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{SwapTransaction, TxHash};
use crate::error::SignerError;

/// Signs and broadcasts unsigned transactions built by the aggregator.
#[async_trait]
pub trait TransactionSigner: Send + Sync + fmt::Debug {
    /// Address transactions are sent from.
    fn address(&self) -> &str;

    /// Signs `tx`, broadcasts it, and returns its hash.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError`] if the holder rejects the request or the
    /// broadcast fails.
    async fn sign_and_send(&self, tx: &SwapTransaction) -> Result<TxHash, SignerError>;
}
