//! Runtime choice between the wallet backends.

use crate::{ClientError, LocalWallet, RemoteWallet, Wallet};
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use config::ChainConfig;

/// Either a JSON-RPC wallet or a local key.
#[derive(Clone)]
pub enum AnyWallet<P> {
    Remote(RemoteWallet),
    Local(LocalWallet<P>),
}

impl<P> AnyWallet<P>
where
    P: Provider + Clone,
{
    /// Pick a backend. A private key takes precedence over a wallet endpoint.
    pub fn from_options(
        wallet_url: Option<&str>,
        private_key: Option<&str>,
        provider: P,
    ) -> Result<Self, ClientError> {
        match (private_key, wallet_url) {
            (Some(key), _) => Ok(Self::Local(LocalWallet::new(key, provider)?)),
            (None, Some(url)) => {
                reqwest::Url::parse(url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
                Ok(Self::Remote(RemoteWallet::new(url)))
            }
            (None, None) => Err(ClientError::Other(
                "no wallet configured, set a wallet url or a private key".to_string(),
            )),
        }
    }

    /// Short backend name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }
}

impl<P> Wallet for AnyWallet<P>
where
    P: Provider + Clone,
{
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        match self {
            Self::Remote(wallet) => wallet.request_accounts().await,
            Self::Local(wallet) => wallet.request_accounts().await,
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        match self {
            Self::Remote(wallet) => wallet.accounts().await,
            Self::Local(wallet) => wallet.accounts().await,
        }
    }

    async fn net_version(&self) -> Result<String, ClientError> {
        match self {
            Self::Remote(wallet) => wallet.net_version().await,
            Self::Local(wallet) => wallet.net_version().await,
        }
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        match self {
            Self::Remote(wallet) => wallet.chain_id().await,
            Self::Local(wallet) => wallet.chain_id().await,
        }
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ClientError> {
        match self {
            Self::Remote(wallet) => wallet.switch_chain(chain_id).await,
            Self::Local(wallet) => wallet.switch_chain(chain_id).await,
        }
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), ClientError> {
        match self {
            Self::Remote(wallet) => wallet.add_chain(chain).await,
            Self::Local(wallet) => wallet.add_chain(chain).await,
        }
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, ClientError> {
        match self {
            Self::Remote(wallet) => wallet.sign_transaction(tx).await,
            Self::Local(wallet) => wallet.sign_transaction(tx).await,
        }
    }
}
