//! Swap service: the end-to-end flow a swap form drives.
//!
//! Resolves tokens from the cached list, converts the human amount with the
//! source token's decimals, tops up the allowance when needed, builds the
//! swap, and hands each transaction to the [`TransactionSigner`].

use std::sync::Arc;

use serde::Serialize;

use super::TransactionSigner;
use crate::client::{GatewayClient, validate_pair};
use crate::domain::{
    Address, AtomicAmount, Quote, QuoteOptions, Token, TxHash, format_units, parse_units,
};
use crate::error::SwapFlowError;

/// What the user asked for, in human units.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapIntent {
    /// Address of the token being sold.
    pub source: String,
    /// Address of the token being bought.
    pub destination: String,
    /// Amount to sell as a decimal string, e.g. `"1.5"`.
    pub amount: String,
    /// Slippage tolerance in percent; the client default applies if unset.
    pub slippage_percent: Option<f64>,
}

/// Quote with both sides formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    /// Source token symbol.
    pub source_symbol: String,
    /// Destination token symbol.
    pub destination_symbol: String,
    /// Source amount in human units.
    pub source_amount: String,
    /// Destination amount in human units.
    pub destination_amount: String,
    /// The underlying quote in atomic units.
    pub quote: Quote,
}

/// Outcome of a completed swap flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    /// Hash of the approval transaction, if one was needed.
    pub approval: Option<TxHash>,
    /// Hash of the swap transaction.
    pub swap: TxHash,
    /// Amount sold, in atomic units.
    pub source_amount: AtomicAmount,
    /// Amount the route was expected to deliver, in atomic units.
    pub expected_destination_amount: AtomicAmount,
}

/// Orchestrates quote, approval, and swap for one wallet.
///
/// The signer is expected to return only once a transaction is accepted by
/// the network, so that the swap built after an approval sees the new
/// allowance.
#[derive(Debug, Clone)]
pub struct SwapService {
    client: Arc<GatewayClient>,
    signer: Arc<dyn TransactionSigner>,
}

impl SwapService {
    /// Creates a service over a shared client and a signer.
    #[must_use]
    pub fn new(client: Arc<GatewayClient>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self { client, signer }
    }

    async fn resolve(&self, address: &str) -> Result<Token, SwapFlowError> {
        let address = Address::parse(address)?;
        let tokens = self.client.list_tokens().await?.into_value();
        tokens
            .get(&address)
            .cloned()
            .ok_or_else(|| SwapFlowError::UnknownToken(address.to_string()))
    }

    /// Quotes a human amount and formats the result with each token's
    /// decimals.
    ///
    /// # Errors
    ///
    /// Returns [`SwapFlowError::UnknownToken`] for tokens missing from the
    /// list, otherwise the client error.
    pub async fn quote_human(
        &self,
        source: &str,
        destination: &str,
        amount: &str,
        options: &QuoteOptions,
    ) -> Result<QuoteView, SwapFlowError> {
        let src = self.resolve(source).await?;
        let dst = self.resolve(destination).await?;
        let atomic = parse_units(amount, src.decimals)?;

        let quote = self
            .client
            .get_quote(src.address.as_str(), dst.address.as_str(), atomic.as_str(), options)
            .await?;

        Ok(QuoteView {
            source_symbol: src.symbol,
            destination_symbol: dst.symbol,
            source_amount: format_units(&quote.source_amount, src.decimals),
            destination_amount: format_units(&quote.destination_amount, dst.decimals),
            quote,
        })
    }

    /// Runs the full swap: allowance check, optional approval, swap.
    ///
    /// The sender is the signer's address. The pair, amount, and slippage
    /// are checked before anything is signed, so a swap that would be
    /// rejected never leaves an approval behind. Approvals are for the exact
    /// amount being sold, never unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`SwapFlowError::UnknownToken`], a client error, or the
    /// signer's error. Nothing after a failed step is attempted.
    pub async fn execute(&self, intent: &SwapIntent) -> Result<SwapReceipt, SwapFlowError> {
        let src = self.resolve(&intent.source).await?;
        let dst = self.resolve(&intent.destination).await?;
        let amount = parse_units(&intent.amount, src.decimals)?;
        let from = Address::parse(self.signer.address())?;
        let options = QuoteOptions {
            slippage_percent: intent.slippage_percent,
            ..QuoteOptions::default()
        };
        validate_pair(
            src.address.as_str(),
            dst.address.as_str(),
            amount.as_str(),
            &options,
        )?;

        let mut approval = None;
        if !src.address.is_native() {
            let allowance = self
                .client
                .get_allowance(src.address.as_str(), from.as_str())
                .await?;
            if allowance < amount {
                tracing::info!(
                    token = %src.address,
                    %allowance,
                    required = %amount,
                    "allowance too low, requesting approval"
                );
                let tx = self
                    .client
                    .build_approval(src.address.as_str(), Some(amount.as_str()))
                    .await?;
                let hash = self.signer.sign_and_send(&tx).await?;
                tracing::info!(%hash, token = %src.address, "approval sent");
                approval = Some(hash);
            }
        }

        let plan = self
            .client
            .build_swap(
                src.address.as_str(),
                dst.address.as_str(),
                amount.as_str(),
                from.as_str(),
                &options,
            )
            .await?;
        let swap = self.signer.sign_and_send(&plan.transaction).await?;
        tracing::info!(
            %swap,
            src = %src.symbol,
            dst = %dst.symbol,
            amount = %amount,
            "swap sent"
        );

        Ok(SwapReceipt {
            approval,
            swap,
            source_amount: amount,
            expected_destination_amount: plan.destination_amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;

    use super::*;
    use crate::client::tests::{
        SWAP_BODY, TOKENS_BODY, USDC, WALLET, WETH, client_with, test_config,
    };
    use crate::client::transport::mock::{MockReply, MockTransport};
    use crate::domain::{NATIVE_TOKEN, SwapTransaction};
    use crate::error::{ClientError, SignerError};

    const APPROVE_BODY: &str = r#"{"data":"0x095ea7b3","gasPrice":"1","to":"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2","value":"0"}"#;

    #[derive(Debug, Default)]
    struct RecordingSigner {
        sent: Mutex<Vec<SwapTransaction>>,
        fail: bool,
    }

    impl RecordingSigner {
        fn sent(&self) -> Vec<SwapTransaction> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl TransactionSigner for RecordingSigner {
        fn address(&self) -> &str {
            WALLET
        }

        async fn sign_and_send(&self, tx: &SwapTransaction) -> Result<TxHash, SignerError> {
            if self.fail {
                return Err(SignerError("user rejected".to_string()));
            }
            let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
            sent.push(tx.clone());
            Ok(TxHash(format!("0xhash{}", sent.len())))
        }
    }

    fn upstream(allowance: &str) -> MockTransport {
        MockTransport::new()
            .route("/tokens", vec![MockReply::ok(TOKENS_BODY)])
            .route(
                "/approve/allowance",
                vec![MockReply::ok(&format!(r#"{{"allowance":"{allowance}"}}"#))],
            )
            .route("/approve/transaction", vec![MockReply::ok(APPROVE_BODY)])
            .route("/swap", vec![MockReply::ok(SWAP_BODY)])
            .route("/quote", vec![MockReply::ok(r#"{"dstAmount":"3868650000"}"#)])
    }

    fn service(
        mock: MockTransport,
        signer: RecordingSigner,
    ) -> (SwapService, Arc<MockTransport>, Arc<RecordingSigner>) {
        let (client, mock) = client_with(test_config(), mock);
        let signer = Arc::new(signer);
        let dyn_signer: Arc<dyn TransactionSigner> = Arc::clone(&signer) as Arc<dyn TransactionSigner>;
        (SwapService::new(Arc::new(client), dyn_signer), mock, signer)
    }

    fn intent(source: &str, destination: &str, amount: &str) -> SwapIntent {
        SwapIntent {
            source: source.to_string(),
            destination: destination.to_string(),
            amount: amount.to_string(),
            slippage_percent: Some(0.5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn low_allowance_triggers_exact_approval_first() {
        let (svc, mock, signer) = service(upstream("0"), RecordingSigner::default());

        let Ok(receipt) = svc.execute(&intent(WETH, USDC, "1")).await else {
            panic!("swap flow");
        };

        assert_eq!(receipt.approval, Some(TxHash("0xhash1".to_string())));
        assert_eq!(receipt.swap, TxHash("0xhash2".to_string()));
        assert_eq!(receipt.source_amount.as_str(), "1000000000000000000");
        assert_eq!(receipt.expected_destination_amount.as_str(), "3868650000");

        let sent = signer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent.first().map(|t| t.data.as_str()), Some("0x095ea7b3"));

        let approvals = mock.calls_to("/approve/transaction");
        let Some(approval) = approvals.first() else {
            panic!("approval requested");
        };
        assert_eq!(approval.query("amount").as_deref(), Some("1000000000000000000"));

        let swaps = mock.calls_to("/swap");
        let Some(swap) = swaps.first() else {
            panic!("swap requested");
        };
        assert_eq!(swap.query("slippage").as_deref(), Some("0.5"));
        assert_eq!(swap.query("from").as_deref(), Some(WALLET));
    }

    #[tokio::test(start_paused = true)]
    async fn sufficient_allowance_skips_approval() {
        let (svc, mock, signer) =
            service(upstream("5000000000000000000"), RecordingSigner::default());

        let Ok(receipt) = svc.execute(&intent(WETH, USDC, "1")).await else {
            panic!("swap flow");
        };

        assert_eq!(receipt.approval, None);
        assert_eq!(signer.sent().len(), 1);
        assert!(mock.calls_to("/approve/transaction").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn native_source_never_checks_allowance() {
        let (svc, mock, signer) = service(upstream("0"), RecordingSigner::default());

        assert!(svc.execute(&intent(NATIVE_TOKEN, USDC, "0.25")).await.is_ok());

        assert!(mock.calls_to("/approve/allowance").is_empty());
        assert_eq!(signer.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn same_token_is_rejected_before_any_approval() {
        let (svc, mock, signer) = service(upstream("0"), RecordingSigner::default());

        let result = svc.execute(&intent(WETH, WETH, "1")).await;

        assert!(matches!(
            result,
            Err(SwapFlowError::Client(ClientError::InvalidParameters(_)))
        ));
        assert!(signer.sent().is_empty());
        assert!(mock.calls_to("/approve/allowance").is_empty());
        assert!(mock.calls_to("/approve/transaction").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_slippage_is_rejected_before_any_approval() {
        let (svc, mock, signer) = service(upstream("0"), RecordingSigner::default());
        let mut request = intent(WETH, USDC, "1");
        request.slippage_percent = Some(80.0);

        let result = svc.execute(&request).await;

        assert!(matches!(
            result,
            Err(SwapFlowError::Client(ClientError::InvalidParameters(_)))
        ));
        assert!(signer.sent().is_empty());
        assert!(mock.calls_to("/approve/transaction").is_empty());
        assert!(mock.calls_to("/swap").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_amount_is_rejected_before_any_approval() {
        let (svc, mock, signer) = service(upstream("0"), RecordingSigner::default());

        let result = svc.execute(&intent(WETH, USDC, "0")).await;

        assert!(matches!(
            result,
            Err(SwapFlowError::Client(ClientError::InvalidParameters(_)))
        ));
        assert!(signer.sent().is_empty());
        assert!(mock.calls_to("/approve/allowance").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_token_stops_before_signing() {
        let (svc, _, signer) = service(upstream("0"), RecordingSigner::default());

        let result = svc
            .execute(&intent(WETH, "0x2222222222222222222222222222222222222222", "1"))
            .await;

        assert!(matches!(result, Err(SwapFlowError::UnknownToken(_))));
        assert!(signer.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn excess_precision_is_rejected() {
        let (svc, mock, _) = service(upstream("0"), RecordingSigner::default());

        let result = svc.execute(&intent(USDC, WETH, "1.0000001")).await;

        assert!(matches!(
            result,
            Err(SwapFlowError::Client(ClientError::InvalidParameters(_)))
        ));
        assert!(mock.calls_to("/swap").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn signer_rejection_propagates() {
        let signer = RecordingSigner {
            fail: true,
            ..RecordingSigner::default()
        };
        let (svc, mock, _) = service(upstream("5000000000000000000"), signer);

        let result = svc.execute(&intent(WETH, USDC, "1")).await;

        assert!(matches!(result, Err(SwapFlowError::Signer(_))));
        assert_eq!(mock.calls_to("/swap").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quote_is_formatted_with_token_decimals() {
        let (svc, mock, _) = service(upstream("0"), RecordingSigner::default());

        let Ok(view) = svc
            .quote_human(WETH, USDC, "1", &QuoteOptions::default())
            .await
        else {
            panic!("quote");
        };

        assert_eq!(view.source_symbol, "WETH");
        assert_eq!(view.destination_symbol, "USDC");
        assert_eq!(view.source_amount, "1");
        assert_eq!(view.destination_amount, "3868.65");
        assert_eq!(view.quote.destination_amount.as_str(), "3868650000");
        assert_eq!(mock.calls_to("/tokens").len(), 1);
    }
}
