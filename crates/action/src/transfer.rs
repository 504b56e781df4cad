use crate::{broadcast, confirm, Action, SignerFn};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use binding::token::IERC20;
use tracing::info;

/// Transfer input data.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// ERC20 token contract
    pub token: Address,
    /// Sender, must match the account signing the transaction
    pub owner: Address,
    pub recipient: Address,
    /// Amount in base units
    pub amount: U256,
}

pub struct TransferAction<P> {
    provider: P,
    signer: SignerFn,
    transfer: Transfer,
    /// Set once the transfer has been broadcast
    tx_hash: Option<TxHash>,
}

impl<P> TransferAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, transfer: Transfer) -> Self {
        Self {
            provider,
            signer,
            transfer,
            tx_hash: None,
        }
    }

    /// Hash of the broadcast transfer, if any.
    pub const fn tx_hash(&self) -> Option<TxHash> {
        self.tx_hash
    }

    fn validate_transfer(&self) -> eyre::Result<()> {
        if self.transfer.token == Address::ZERO {
            eyre::bail!("Token must not be zero");
        }

        if self.transfer.owner == Address::ZERO {
            eyre::bail!("Owner must not be zero");
        }

        if self.transfer.recipient == Address::ZERO {
            eyre::bail!("Recipient must not be zero");
        }

        if self.transfer.recipient == self.transfer.token {
            eyre::bail!("Recipient must not be the token contract");
        }

        if self.transfer.amount == U256::ZERO {
            eyre::bail!("Amount must not be zero");
        }

        Ok(())
    }

    /// Simulate, sign and broadcast the transfer without waiting for inclusion.
    pub async fn send(&mut self) -> eyre::Result<TxHash> {
        self.validate_transfer()?;

        let contract = IERC20::new(self.transfer.token, &self.provider);
        let call = contract
            .transfer(self.transfer.recipient, self.transfer.amount)
            .from(self.transfer.owner);

        if !call.call().await? {
            eyre::bail!("Token returned false for transfer");
        }

        let tx_hash =
            broadcast(&self.provider, &self.signer, call.into_transaction_request()).await?;
        self.tx_hash = Some(tx_hash);

        Ok(tx_hash)
    }
}

impl<P> Action for TransferAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.validate_transfer().is_err() {
            return Ok(false);
        }

        let contract = IERC20::new(self.transfer.token, &self.provider);
        let balance = contract.balanceOf(self.transfer.owner).call().await?;
        Ok(balance >= self.transfer.amount)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.tx_hash else {
            return Ok(false);
        };

        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(false);
        };

        Ok(receipt.status())
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if self.is_completed().await? {
            eyre::bail!("Transfer already executed");
        }

        let tx_hash = self.send().await?;
        let result = confirm(&self.provider, tx_hash).await?;

        info!(
            token = %self.transfer.token,
            recipient = %self.transfer.recipient,
            amount = %self.transfer.amount,
            "Transfer confirmed"
        );

        Ok(result)
    }

    fn description(&self) -> String {
        format!(
            "Transfer {} of token {} from {} to {}",
            self.transfer.amount, self.transfer.token, self.transfer.owner, self.transfer.recipient,
        )
    }
}
