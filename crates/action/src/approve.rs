use crate::{broadcast, confirm, Action, SignerFn};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use binding::token::IERC20;
use tracing::info;

/// Input for an approve action.
#[derive(Debug, Clone)]
pub struct Approve {
    /// ERC20 token contract
    pub token: Address,
    /// Token owner, must match the account signing the transaction
    pub owner: Address,
    /// Address allowed to spend the owner's tokens
    pub spender: Address,
    /// Allowance in base units
    pub amount: U256,
}

/// Approve action setting an ERC20 allowance.
pub struct ApproveAction<P> {
    provider: P,
    signer: SignerFn,
    approve: Approve,
}

impl<P> ApproveAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, approve: Approve) -> Self {
        Self {
            provider,
            signer,
            approve,
        }
    }

    fn validate_approve(&self) -> eyre::Result<()> {
        if self.approve.token == Address::ZERO {
            eyre::bail!("Token must not be zero");
        }

        if self.approve.owner == Address::ZERO {
            eyre::bail!("Owner must not be zero");
        }

        if self.approve.spender == Address::ZERO {
            eyre::bail!("Spender must not be zero");
        }

        Ok(())
    }

    /// Current allowance of the spender.
    pub async fn current_allowance(&self) -> eyre::Result<U256> {
        let contract = IERC20::new(self.approve.token, &self.provider);
        let allowance = contract
            .allowance(self.approve.owner, self.approve.spender)
            .call()
            .await?;
        Ok(allowance)
    }

    /// Simulate, sign and broadcast the approval without waiting for inclusion.
    pub async fn send(&self) -> eyre::Result<TxHash> {
        self.validate_approve()?;

        let contract = IERC20::new(self.approve.token, &self.provider);
        let call = contract
            .approve(self.approve.spender, self.approve.amount)
            .from(self.approve.owner);

        // eth_call first so reverts surface before the wallet is asked to sign
        if !call.call().await? {
            eyre::bail!("Token returned false for approve");
        }

        broadcast(&self.provider, &self.signer, call.into_transaction_request()).await
    }
}

impl<P> Action for ApproveAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.validate_approve().is_ok())
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        Ok(self.current_allowance().await? == self.approve.amount)
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        let tx_hash = self.send().await?;
        let result = confirm(&self.provider, tx_hash).await?;

        info!(
            token = %self.approve.token,
            spender = %self.approve.spender,
            amount = %self.approve.amount,
            "Approval confirmed"
        );

        Ok(result)
    }

    fn description(&self) -> String {
        format!(
            "Approve {} to spend {} of token {} owned by {}",
            self.approve.spender, self.approve.amount, self.approve.token, self.approve.owner,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use crate::test_utils::{
        encoded_bool, mock_signer, raw_signer, receipt, scripted_provider, MockProvider,
    };

    fn approve() -> Approve {
        Approve {
            token: Address::repeat_byte(1),
            owner: Address::repeat_byte(2),
            spender: Address::repeat_byte(3),
            amount: U256::from(1_000u64),
        }
    }

    #[test]
    fn test_approve_validation() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        assert!(action.validate_approve().is_ok());
    }

    #[test]
    fn test_approve_validation_zero_token() {
        let input = Approve {
            token: Address::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        let result = action.validate_approve();
        assert!(result.unwrap_err().to_string().contains("Token"));
    }

    #[test]
    fn test_approve_validation_zero_owner() {
        let input = Approve {
            owner: Address::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        let result = action.validate_approve();
        assert!(result.unwrap_err().to_string().contains("Owner"));
    }

    #[test]
    fn test_approve_validation_zero_spender() {
        let input = Approve {
            spender: Address::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        let result = action.validate_approve();
        assert!(result.unwrap_err().to_string().contains("Spender"));
    }

    #[test]
    fn test_approve_zero_amount_is_valid() {
        // revoking an allowance is an approval of 0
        let input = Approve {
            amount: U256::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        assert!(action.validate_approve().is_ok());
    }

    #[tokio::test]
    async fn test_is_ready() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        assert!(action.is_ready().await.unwrap());

        let input = Approve {
            spender: Address::ZERO,
            ..approve()
        };
        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        assert!(!action.is_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_input_before_rpc() {
        let input = Approve {
            token: Address::ZERO,
            ..approve()
        };

        let action = ApproveAction::new(MockProvider, mock_signer(), input);
        let err = action.send().await.unwrap_err();
        assert!(err.to_string().contains("Token must not be zero"));
    }

    #[test]
    fn test_description() {
        let action = ApproveAction::new(MockProvider, mock_signer(), approve());
        let desc = action.description();

        assert!(desc.starts_with("Approve"));
        assert!(desc.contains("0x0303030303030303030303030303030303030303")); // spender
        assert!(desc.contains("1000"));
        assert!(desc.contains("0x0101010101010101010101010101010101010101")); // token
    }

    #[tokio::test]
    async fn test_execute_confirms_approval() {
        let (asserter, provider) = scripted_provider();
        let tx_hash = TxHash::repeat_byte(0xab);
        asserter.push_success(&encoded_bool(true)); // eth_call
        asserter.push_success(&tx_hash); // eth_sendRawTransaction
        asserter.push_success(&receipt(tx_hash, true)); // eth_getTransactionReceipt

        let mut action = ApproveAction::new(provider, raw_signer(), approve());
        let result = action.execute().await.unwrap();

        assert_eq!(result.tx_hash, tx_hash);
        assert_eq!(result.block_number, Some(7));
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test]
    async fn test_execute_reverted_receipt() {
        let (asserter, provider) = scripted_provider();
        let tx_hash = TxHash::repeat_byte(0xab);
        asserter.push_success(&encoded_bool(true));
        asserter.push_success(&tx_hash);
        asserter.push_success(&receipt(tx_hash, false));

        let mut action = ApproveAction::new(provider, raw_signer(), approve());
        let err = action.execute().await.unwrap_err();

        assert!(err.to_string().contains("reverted"));
    }

    #[tokio::test]
    async fn test_send_stops_when_token_returns_false() {
        let (asserter, provider) = scripted_provider();
        asserter.push_success(&encoded_bool(false));

        // mock_signer panics, so reaching the wallet would fail the test
        let action = ApproveAction::new(provider, mock_signer(), approve());
        let err = action.send().await.unwrap_err();

        assert_eq!(err.to_string(), "Token returned false for approve");
    }

    #[tokio::test]
    async fn test_is_completed_compares_allowance() {
        let (asserter, provider) = scripted_provider();
        asserter.push_success(&Bytes::from(U256::from(1_000u64).to_be_bytes::<32>().to_vec()));
        asserter.push_success(&Bytes::from(U256::from(10u64).to_be_bytes::<32>().to_vec()));

        let action = ApproveAction::new(provider, mock_signer(), approve());

        assert!(action.is_completed().await.unwrap());
        assert!(!action.is_completed().await.unwrap());
    }
}
