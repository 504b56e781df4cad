//! Wallet-driven ERC20 console.
//!
//! [`Session`] keeps what the user sees (connected account, network, token
//! info, allowance, approve/transfer progress) and implements each user
//! operation as a short sequence of wallet and chain calls.

pub mod config;
pub mod metrics;

use ::config::{ChainConfig, NetworkConfig};
use action::{
    approve::{Approve, ApproveAction},
    confirm, error_summary,
    transfer::{Transfer, TransferAction},
    Action, SignerFn,
};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use client::{primary_account, wallet_signer_fn, ClientError, Wallet};
use crate::metrics::Metrics;
use serde::Serialize;
use std::time::Duration;
use token::{
    effective_decimals, format_amount, parse_amount, ReadStrategy, TokenInfo, TokenQuery,
    TokenReader,
};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, error, info, warn};

/// Progress of an approve or transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxStatus {
    /// Broadcast, waiting for the receipt
    pub in_process: bool,
    /// Included with a successful receipt
    pub confirmed: bool,
    /// First sentence of the failure, if any
    pub error: Option<String>,
    pub tx_hash: Option<TxHash>,
}

/// Delays between refresh attempts: 100ms, 200ms, 400ms, each capped at
/// [`MAX_REFRESH_DELAY`].
pub fn refresh_backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(MAX_REFRESH_DELAY)
        .take(3)
}

/// Longest single wait between refresh attempts.
pub const MAX_REFRESH_DELAY: Duration = Duration::from_secs(5);

/// State shown to the user, consistent with the last successful calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_wallet_connected: bool,
    pub wallet_address: Option<Address>,
    /// Network id from `net_version`
    pub network: Option<String>,
    pub chain_id: Option<u64>,
    pub token_info: Option<TokenInfo>,
    pub allowance_amount: String,
    pub approve: TxStatus,
    pub transfer: TxStatus,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_wallet_connected: false,
            wallet_address: None,
            network: None,
            chain_id: None,
            token_info: None,
            allowance_amount: "0".to_string(),
            approve: TxStatus::default(),
            transfer: TxStatus::default(),
        }
    }
}

/// A user session against one wallet and one token.
pub struct Session<W, P> {
    wallet: W,
    provider: P,
    reader: TokenReader<P>,
    signer: SignerFn,
    network: NetworkConfig,
    metrics: Metrics,
    state: SessionState,
}

impl<W, P> Session<W, P>
where
    W: Wallet + Clone + 'static,
    P: Provider + Clone + 'static,
{
    /// Create a session. Transactions are signed by `wallet`.
    pub fn new(wallet: W, provider: P, network: NetworkConfig, metrics: Metrics) -> Self {
        let signer = wallet_signer_fn(wallet.clone(), provider.clone());
        Self::with_signer(wallet, provider, signer, network, metrics)
    }

    /// Create a session with a custom transaction signer.
    pub fn with_signer(
        wallet: W,
        provider: P,
        signer: SignerFn,
        network: NetworkConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            reader: TokenReader::new(provider.clone(), network.chain.multicall3),
            wallet,
            provider,
            signer,
            network,
            metrics,
            state: SessionState::default(),
        }
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Ask the wallet for its accounts and remember the first one.
    pub async fn connect_wallet(&mut self) -> eyre::Result<Address> {
        let accounts = self.wallet.request_accounts().await?;
        let account = accounts.first().copied().ok_or(ClientError::NoAccounts)?;
        info!(%account, "Connected account");

        self.state.wallet_address = Some(account);
        self.state.is_wallet_connected = true;

        Ok(account)
    }

    /// Record the wallet's network and chain id.
    ///
    /// Returns whether the wallet is on the configured chain.
    pub async fn check_network(&mut self) -> eyre::Result<bool> {
        let network = self.wallet.net_version().await?;
        let chain_id = self.wallet.chain_id().await?;
        info!(%network, chain_id, "Network");

        self.state.network = Some(network.clone());
        self.state.chain_id = Some(chain_id);

        let on_chain = chain_id == self.network.chain.chain_id;
        if on_chain {
            info!(chain = %self.network.chain.chain_name, "Connected to configured network");
        } else {
            info!(%network, chain_id, "Connected to unknown network");
        }
        self.metrics.set_on_configured_chain(on_chain);

        Ok(on_chain)
    }

    /// Switch the wallet to `chain`, registering it first if the wallet does
    /// not know it, then re-check the network.
    pub async fn change_network(&mut self, chain: &ChainConfig) -> eyre::Result<bool> {
        if let Err(e) = self.switch_or_add_chain(chain).await {
            error!(chain = %chain.chain_name, error = %e, "Error switching network");
            return Err(e.into());
        }
        info!(chain = %chain.chain_name, "Switched network");

        self.check_network().await
    }

    async fn switch_or_add_chain(&self, chain: &ChainConfig) -> Result<(), ClientError> {
        let chain_id = chain.hex_chain_id();
        match self.wallet.switch_chain(&chain_id).await {
            Err(e) if e.is_unrecognized_chain() => {
                warn!(%chain_id, "Wallet does not know the chain, adding it");
                self.wallet.add_chain(chain).await?;
                self.wallet.switch_chain(&chain_id).await
            }
            other => other,
        }
    }

    /// Read token metadata and balance with `strategy`.
    ///
    /// The joined strategy reads for the connected account and is skipped
    /// (`Ok(None)`) when no account is connected; the others ask the wallet
    /// for its current account.
    pub async fn read_token_info(
        &mut self,
        strategy: ReadStrategy,
    ) -> eyre::Result<Option<TokenInfo>> {
        let owner = match strategy {
            ReadStrategy::Joined => match self.state.wallet_address {
                Some(address) => address,
                None => {
                    debug!("No connected account, skipping joined read");
                    return Ok(None);
                }
            },
            ReadStrategy::Sequential | ReadStrategy::Multicall => {
                primary_account(&self.wallet).await?
            }
        };

        let result = self
            .reader
            .token_info(strategy, self.network.token.token, owner)
            .await;
        self.metrics.record_read(strategy, result.is_ok());
        let info = result?;

        info!(%strategy, %info, "Token info");
        self.metrics.set_balance(&info.symbol, &info.balance);
        self.state.token_info = Some(info.clone());

        Ok(Some(info))
    }

    /// Read the allowance granted to the configured spender.
    pub async fn read_allowance(&mut self) -> eyre::Result<String> {
        let owner = primary_account(&self.wallet).await?;
        let spender = self.network.token.spender;

        let allowance = self
            .reader
            .allowance(self.network.token.token, owner, spender)
            .await?;
        debug!(%owner, %spender, %allowance, "Raw allowance");

        let amount = format_amount(allowance, effective_decimals(self.state.token_info.as_ref()))?;
        info!(%spender, %amount, "Allowance");
        self.metrics.set_allowance(&amount);
        self.state.allowance_amount = amount.clone();

        Ok(amount)
    }

    /// Re-read token info and allowance, retrying transient failures.
    pub async fn refresh(&mut self, strategy: ReadStrategy) -> eyre::Result<TokenInfo> {
        let retry_strategy = refresh_backoff();

        let owner = match self.state.wallet_address {
            Some(address) => address,
            None => primary_account(&self.wallet).await?,
        };
        let reader = &self.reader;
        let token = self.network.token;

        let (info, allowance) = Retry::spawn(retry_strategy, || async move {
            let info = reader.token_info(strategy, token.token, owner).await?;
            let allowance = reader.allowance(token.token, owner, token.spender).await?;
            Ok::<_, eyre::Report>((info, allowance))
        })
        .await
        .inspect_err(|_| self.metrics.record_read(strategy, false))?;
        self.metrics.record_read(strategy, true);

        let amount = format_amount(allowance, effective_decimals(Some(&info)))?;
        self.metrics.set_balance(&info.symbol, &info.balance);
        self.metrics.set_allowance(&amount);

        self.state.token_info = Some(info.clone());
        self.state.allowance_amount = amount;

        Ok(info)
    }

    /// Approve the configured spender for `amount` whole tokens.
    ///
    /// Failures are recorded in the approve status rather than returned.
    pub async fn approve_tokens(&mut self, amount: &str) -> &TxStatus {
        self.state.approve = TxStatus::default();

        match self.run_approve(amount).await {
            Ok(result) => {
                self.state.approve.in_process = false;
                self.state.approve.confirmed = true;
                self.state.approve.tx_hash = Some(result.tx_hash);
                self.metrics.record_outcome("approve", true);
            }
            Err(e) => {
                error!(error = %e, "Error approving tokens");
                self.state.approve.in_process = false;
                self.state.approve.error = Some(error_summary(&e));
                self.metrics.record_outcome("approve", false);
            }
        }

        &self.state.approve
    }

    async fn run_approve(&mut self, amount: &str) -> eyre::Result<action::Result> {
        let owner = primary_account(&self.wallet).await?;
        let amount = parse_amount(amount, effective_decimals(self.state.token_info.as_ref()))?;

        let approval = ApproveAction::new(
            self.provider.clone(),
            self.signer.clone(),
            Approve {
                token: self.network.token.token,
                owner,
                spender: self.network.token.spender,
                amount,
            },
        );
        info!(description = %approval.description(), "Approve");

        let tx_hash = approval.send().await?;
        self.state.approve.tx_hash = Some(tx_hash);
        self.state.approve.in_process = true;
        self.metrics.record_submitted("approve");

        confirm(&self.provider, tx_hash).await
    }

    /// Transfer `amount` whole tokens to `recipient`.
    ///
    /// Does nothing and returns `None` when the recipient or amount is
    /// missing. Failures are recorded in the transfer status.
    pub async fn transfer_tokens(
        &mut self,
        recipient: Option<Address>,
        amount: &str,
    ) -> Option<&TxStatus> {
        let recipient = recipient?;
        if amount.trim().is_empty() {
            return None;
        }

        self.state.transfer = TxStatus::default();

        match self.run_transfer(recipient, amount).await {
            Ok(result) => {
                self.state.transfer.in_process = false;
                self.state.transfer.confirmed = true;
                self.state.transfer.tx_hash = Some(result.tx_hash);
                self.metrics.record_outcome("transfer", true);
            }
            Err(e) => {
                error!(error = %e, "Error transferring tokens");
                self.state.transfer.in_process = false;
                self.state.transfer.error = Some(error_summary(&e));
                self.metrics.record_outcome("transfer", false);
            }
        }

        Some(&self.state.transfer)
    }

    async fn run_transfer(
        &mut self,
        recipient: Address,
        amount: &str,
    ) -> eyre::Result<action::Result> {
        let owner = primary_account(&self.wallet).await?;
        let amount = parse_amount(amount, effective_decimals(self.state.token_info.as_ref()))?;

        let mut transfer = TransferAction::new(
            self.provider.clone(),
            self.signer.clone(),
            Transfer {
                token: self.network.token.token,
                owner,
                recipient,
                amount,
            },
        );
        info!(description = %transfer.description(), "Transfer");

        let tx_hash = transfer.send().await?;
        self.state.transfer.tx_hash = Some(tx_hash);
        self.state.transfer.in_process = true;
        self.metrics.record_submitted("transfer");

        confirm(&self.provider, tx_hash).await
    }
}
