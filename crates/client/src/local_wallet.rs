//! Wallet backed by a local private key.

use crate::{ClientError, Wallet};
use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use config::ChainConfig;

/// A single-key wallet.
///
/// Network queries go to the RPC provider it was created with, so it can
/// only ever be "on" that provider's chain.
#[derive(Clone)]
pub struct LocalWallet<P> {
    address: Address,
    wallet: EthereumWallet,
    provider: P,
}

impl<P> LocalWallet<P>
where
    P: Provider + Clone,
{
    /// Create a wallet from a hex private key (with or without `0x`).
    pub fn new(private_key: &str, provider: P) -> Result<Self, ClientError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))?;

        Ok(Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
            provider,
        })
    }

    /// Address of the key.
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl<P> Wallet for LocalWallet<P>
where
    P: Provider + Clone,
{
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        Ok(vec![self.address])
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        Ok(vec![self.address])
    }

    async fn net_version(&self) -> Result<String, ClientError> {
        let version = self
            .provider
            .get_net_version()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(version.to_string())
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ClientError> {
        let requested = parse_hex_chain_id(chain_id)?;
        let current = self.chain_id().await?;
        if requested != current {
            return Err(ClientError::UnsupportedChain(format!(
                "{chain_id} (key wallet is bound to chain {current})"
            )));
        }
        Ok(())
    }

    async fn add_chain(&self, _chain: &ChainConfig) -> Result<(), ClientError> {
        Err(ClientError::Unsupported("wallet_addEthereumChain"))
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, ClientError> {
        let tx_envelope: TxEnvelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| ClientError::Signing(e.to_string()))?;

        let mut encoded = Vec::new();
        tx_envelope.encode_2718(&mut encoded);
        Ok(Bytes::from(encoded))
    }
}

fn parse_hex_chain_id(chain_id: &str) -> Result<u64, ClientError> {
    let digits = chain_id
        .strip_prefix("0x")
        .or_else(|| chain_id.strip_prefix("0X"))
        .ok_or_else(|| ClientError::UnsupportedChain(chain_id.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| ClientError::UnsupportedChain(chain_id.to_string()))
}
