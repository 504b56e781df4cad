mod any_wallet;
mod local_wallet;
mod remote_wallet;

use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use config::ChainConfig;
pub use any_wallet::AnyWallet;
pub use local_wallet::LocalWallet;
pub use remote_wallet::RemoteWallet;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// EIP-1193 code for a chain the wallet does not know yet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// EIP-1193 code for a request the user rejected.
pub const USER_REJECTED: i64 = 4001;

/// A function that signs a transaction request and returns signed bytes.
///
/// Actions only see this type, so they work the same with a local key and
/// with an external wallet.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Wallet answered with a JSON-RPC error object
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Wallet exposed no account
    #[error("Wallet returned no accounts")]
    NoAccounts,

    /// Wallet cannot operate on the requested chain
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    /// Wallet does not implement the requested method
    #[error("Unsupported wallet method: {0}")]
    Unsupported(&'static str),

    /// Transaction could not be signed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// General error with context
    #[error("Client error: {0}")]
    Other(String),
}

impl ClientError {
    /// Whether the wallet rejected a chain switch because it does not know the chain.
    pub const fn is_unrecognized_chain(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == UNRECOGNIZED_CHAIN)
    }

    /// Whether the user declined the request in the wallet.
    pub const fn is_user_rejected(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED)
    }
}

/// Account and chain access delegated to a wallet.
///
/// Mirrors the wallet RPC surface the console needs: account discovery,
/// network inspection and switching, and transaction signing.
pub trait Wallet: Send + Sync {
    /// Ask the wallet to expose its accounts (`eth_requestAccounts`).
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, ClientError>> + Send;

    /// Accounts already exposed to us (`eth_accounts`).
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, ClientError>> + Send;

    /// Network id as reported by `net_version`.
    fn net_version(&self) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Chain id the wallet is connected to (`eth_chainId`).
    fn chain_id(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Switch the wallet to `chain_id`, given in `0x` hex form.
    fn switch_chain(&self, chain_id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Register a chain with the wallet (`wallet_addEthereumChain`).
    fn add_chain(&self, chain: &ChainConfig)
        -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Sign a fully populated transaction, returning EIP-2718 bytes.
    fn sign_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<Bytes, ClientError>> + Send;
}

/// First account a wallet exposes.
pub async fn primary_account<W: Wallet>(wallet: &W) -> Result<Address, ClientError> {
    wallet
        .accounts()
        .await?
        .first()
        .copied()
        .ok_or(ClientError::NoAccounts)
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create a SignerFn from a wallet and provider.
///
/// The provider is used to fill transaction fields (nonce, gas, fees) before
/// handing the request to the wallet for signing.
pub fn wallet_signer_fn<W, P>(wallet: W, provider: P) -> SignerFn
where
    W: Wallet + Clone + 'static,
    P: Provider + Clone + 'static,
{
    Arc::new(move |tx| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let from = match tx.from {
                Some(from) => from,
                None => primary_account(&wallet).await?,
            };
            let chain_id = wallet.chain_id().await?;
            let filled_tx = fill_transaction(tx, &provider, from, chain_id).await?;
            let signed = wallet.sign_transaction(filled_tx).await?;
            Ok(signed)
        })
    })
}

/// Fill missing transaction fields using the provider.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Fees first, gas estimation may need them
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // 20% headroom
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    Ok(tx)
}
