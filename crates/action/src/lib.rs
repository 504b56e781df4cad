pub mod approve;
pub mod transfer;

use alloy_primitives::{TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionReceipt, TransactionRequest};
pub use client::SignerFn;
use std::future::Future;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{debug, info};

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action.
    ///
    /// Returns the transaction hash of the executed action.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<Result>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Result {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<U256>,
}

/// Short form of an error for display: its first sentence.
///
/// A sentence ends at a `.` followed by whitespace or the end of the
/// message, so decimal amounts and dotted names stay intact. RPC and revert
/// errors carry long explanations and hex payloads after the first sentence.
pub fn error_summary(error: &eyre::Report) -> String {
    let message = error.to_string();
    let end = message
        .char_indices()
        .find(|&(i, c)| c == '.' && message[i + 1..].chars().next().is_none_or(char::is_whitespace))
        .map_or(message.len(), |(i, _)| i);

    let first = message[..end].trim();
    if first.is_empty() {
        message.trim().to_string()
    } else {
        first.to_string()
    }
}

/// Interval between receipt polls.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

/// Receipt polls before a broadcast transaction is given up on.
pub const RECEIPT_POLL_ATTEMPTS: usize = 90;

/// Sign `tx` and broadcast it.
pub(crate) async fn broadcast<P>(
    provider: &P,
    signer: &SignerFn,
    tx: TransactionRequest,
) -> eyre::Result<TxHash>
where
    P: Provider,
{
    let raw = signer(tx).await?;
    let pending = provider.send_raw_transaction(&raw).await?;
    let tx_hash = *pending.tx_hash();
    info!(%tx_hash, "Transaction submitted");
    Ok(tx_hash)
}

/// Wait for the receipt of a broadcast transaction, failing on revert.
///
/// Polls `eth_getTransactionReceipt` every [`RECEIPT_POLL_INTERVAL_MS`], at
/// most [`RECEIPT_POLL_ATTEMPTS`] more times after the first poll.
pub async fn confirm<P>(provider: &P, tx_hash: TxHash) -> eyre::Result<Result>
where
    P: Provider,
{
    let poll = FixedInterval::from_millis(RECEIPT_POLL_INTERVAL_MS).take(RECEIPT_POLL_ATTEMPTS);

    let receipt = Retry::spawn(poll, || async move {
        match provider.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => Ok(receipt),
            Ok(None) => {
                debug!(%tx_hash, "Receipt not available yet");
                Err(eyre::eyre!("Transaction {tx_hash} was not mined in time"))
            }
            Err(e) => {
                debug!(%tx_hash, error = %e, "Receipt poll failed");
                Err(e.into())
            }
        }
    })
    .await?;

    check_receipt(&receipt)
}

/// Turn a receipt into a [`Result`], failing when its status is a revert.
pub fn check_receipt(receipt: &TransactionReceipt) -> eyre::Result<Result> {
    if !receipt.status() {
        eyre::bail!("Transaction {} reverted", receipt.transaction_hash);
    }

    info!(
        tx_hash = %receipt.transaction_hash,
        block_number = receipt.block_number,
        gas_used = receipt.gas_used,
        "Transaction confirmed"
    );

    Ok(Result {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: Some(U256::from(receipt.gas_used)),
    })
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::SignerFn;
    use alloy_consensus::{Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom};
    use alloy_primitives::{Address, Bloom, Bytes, TxHash, B256, U256};
    use alloy_provider::{mock::Asserter, network::Ethereum, Provider, ProviderBuilder, RootProvider};
    use alloy_rpc_types::TransactionReceipt;
    use std::sync::Arc;

    /// Mock provider for unit tests.
    #[derive(Clone)]
    pub struct MockProvider;

    impl Provider for MockProvider {
        fn root(&self) -> &RootProvider<Ethereum> {
            todo!()
        }
    }

    /// Provider answering from a queue of canned JSON-RPC responses.
    pub fn scripted_provider() -> (Asserter, impl Provider + Clone) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        (asserter, provider)
    }

    /// Create a mock signer for testing that panics if called.
    /// Used for tests that don't actually execute transactions.
    pub fn mock_signer() -> SignerFn {
        Arc::new(|_tx| Box::pin(async { panic!("mock signer should not be called") }))
    }

    /// Signer returning fixed bytes without touching the network.
    pub fn raw_signer() -> SignerFn {
        Arc::new(|_tx| Box::pin(async { Ok(Bytes::from_static(&[0x02, 0xc0])) }))
    }

    /// ABI encoding of a `bool` return value.
    pub fn encoded_bool(value: bool) -> Bytes {
        Bytes::from(U256::from(u8::from(value)).to_be_bytes::<32>().to_vec())
    }

    /// Mined receipt with the given status.
    pub fn receipt(tx_hash: TxHash, success: bool) -> TransactionReceipt {
        TransactionReceipt {
            inner: ReceiptEnvelope::Eip1559(ReceiptWithBloom {
                receipt: Receipt {
                    status: Eip658Value::Eip658(success),
                    cumulative_gas_used: 46_000,
                    logs: vec![],
                },
                logs_bloom: Bloom::default(),
            }),
            transaction_hash: tx_hash,
            transaction_index: Some(0),
            block_hash: Some(B256::repeat_byte(7)),
            block_number: Some(7),
            gas_used: 46_000,
            effective_gas_price: 1_000_000_000,
            blob_gas_used: None,
            blob_gas_price: None,
            from: Address::repeat_byte(2),
            to: Some(Address::repeat_byte(1)),
            contract_address: None,
        }
    }
}
