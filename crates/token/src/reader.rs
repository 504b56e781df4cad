use crate::{format_amount, ReadStrategy, TokenError, TokenInfo, TokenQuery, NOT_AVAILABLE};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::SolCall;
use binding::{
    multicall::IMulticall3::{self, Call3, Call3Result},
    token::IERC20,
};
use eyre::Result;
use tracing::debug;

/// Token reader over an RPC provider.
pub struct TokenReader<P> {
    provider: P,
    multicall3: Address,
}

impl<P> TokenReader<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, multicall3: Address) -> Self {
        Self {
            provider,
            multicall3,
        }
    }

    /// Read with the given strategy.
    pub async fn read(
        &self,
        strategy: ReadStrategy,
        token: Address,
        owner: Address,
    ) -> Result<TokenInfo> {
        match strategy {
            ReadStrategy::Sequential => self.read_sequential(token, owner).await,
            ReadStrategy::Multicall => self.read_multicall(token, owner).await,
            ReadStrategy::Joined => self.read_joined(token, owner).await,
        }
    }

    /// One call per field, in order.
    pub async fn read_sequential(&self, token: Address, owner: Address) -> Result<TokenInfo> {
        let contract = IERC20::new(token, &self.provider);

        let name = contract.name().call().await?;
        debug!(%token, %name, "Token name");

        let symbol = contract.symbol().call().await?;
        debug!(%token, %symbol, "Token symbol");

        let decimals = contract.decimals().call().await?;
        debug!(%token, decimals, "Token decimals");

        let balance = contract.balanceOf(owner).call().await?;
        debug!(%token, %owner, %balance, "Token balance");

        Ok(TokenInfo {
            name,
            symbol,
            decimals,
            balance: format_amount(balance, decimals)?,
        })
    }

    /// All four reads in one Multicall3 `aggregate3` call.
    pub async fn read_multicall(&self, token: Address, owner: Address) -> Result<TokenInfo> {
        let multicall = IMulticall3::new(self.multicall3, &self.provider);
        let results = multicall
            .aggregate3(multicall_calls(token, owner))
            .call()
            .await?;
        debug!(
            %token,
            %owner,
            failed = results.iter().filter(|r| !r.success).count(),
            "Multicall token read"
        );

        Ok(decode_multicall(&results)?)
    }

    /// All four reads issued concurrently.
    pub async fn read_joined(&self, token: Address, owner: Address) -> Result<TokenInfo> {
        let contract = IERC20::new(token, &self.provider);

        let (name, decimals, symbol, balance) = tokio::try_join!(
            async { contract.name().call().await },
            async { contract.decimals().call().await },
            async { contract.symbol().call().await },
            async { contract.balanceOf(owner).call().await },
        )?;
        debug!(%token, %name, %symbol, decimals, %balance, "Joined token read");

        Ok(TokenInfo {
            name,
            symbol,
            decimals,
            balance: format_amount(balance, decimals)?,
        })
    }

    /// Raw balance of `owner`.
    pub async fn read_raw_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        Ok(contract.balanceOf(owner).call().await?)
    }

    /// Allowance `owner` granted to `spender`.
    pub async fn read_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        debug!(%token, %owner, %spender, "Querying allowance");

        let contract = IERC20::new(token, &self.provider);
        let allowance = contract.allowance(owner, spender).call().await?;

        Ok(allowance)
    }
}

impl<P> TokenQuery for TokenReader<P>
where
    P: Provider + Clone,
{
    async fn token_info(
        &self,
        strategy: ReadStrategy,
        token: Address,
        owner: Address,
    ) -> Result<TokenInfo> {
        self.read(strategy, token, owner).await
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        self.read_allowance(token, owner, spender).await
    }
}

/// The `name`, `symbol`, `decimals`, `balanceOf(owner)` batch, in that order.
pub fn multicall_calls(token: Address, owner: Address) -> Vec<Call3> {
    let call = |data: Vec<u8>| Call3 {
        target: token,
        allowFailure: true,
        callData: data.into(),
    };

    vec![
        call(IERC20::nameCall {}.abi_encode()),
        call(IERC20::symbolCall {}.abi_encode()),
        call(IERC20::decimalsCall {}.abi_encode()),
        call(IERC20::balanceOfCall { account: owner }.abi_encode()),
    ]
}

/// Build a [`TokenInfo`] from the batch produced by [`multicall_calls`].
///
/// Failed slots degrade: name and symbol to `"N/A"`, decimals to 0 and the
/// balance to `"N/A"`. The balance is formatted with the decimals that were
/// actually read, degraded or not.
pub fn decode_multicall(results: &[Call3Result]) -> Result<TokenInfo, TokenError> {
    let [name, symbol, decimals, balance] = results else {
        return Err(TokenError::MulticallShape(results.len()));
    };

    let name =
        decode_slot::<IERC20::nameCall>(name).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let symbol =
        decode_slot::<IERC20::symbolCall>(symbol).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let decimals = decode_slot::<IERC20::decimalsCall>(decimals).unwrap_or(0);
    let balance = match decode_slot::<IERC20::balanceOfCall>(balance) {
        Some(raw) => format_amount(raw, decimals)?,
        None => NOT_AVAILABLE.to_string(),
    };

    Ok(TokenInfo {
        name,
        symbol,
        decimals,
        balance,
    })
}

fn decode_slot<C: SolCall>(result: &Call3Result) -> Option<C::Return> {
    if !result.success {
        return None;
    }
    C::abi_decode_returns(&result.returnData).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use alloy_sol_types::SolValue;

    fn ok(data: Vec<u8>) -> Call3Result {
        Call3Result {
            success: true,
            returnData: data.into(),
        }
    }

    fn failed() -> Call3Result {
        Call3Result {
            success: false,
            returnData: Bytes::new(),
        }
    }

    fn encoded_string(value: &str) -> Vec<u8> {
        (value.to_string(),).abi_encode_params()
    }

    #[test]
    fn test_multicall_calls() {
        let token = Address::repeat_byte(1);
        let owner = Address::repeat_byte(2);
        let calls = multicall_calls(token, owner);

        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.target == token && c.allowFailure));
        assert_eq!(calls[0].callData[..4], IERC20::nameCall::SELECTOR);
        assert_eq!(calls[1].callData[..4], IERC20::symbolCall::SELECTOR);
        assert_eq!(calls[2].callData[..4], IERC20::decimalsCall::SELECTOR);
        assert_eq!(calls[3].callData[..4], IERC20::balanceOfCall::SELECTOR);
        // selector + one address word
        assert_eq!(calls[3].callData.len(), 36);
        assert_eq!(calls[3].callData[16..36], owner[..]);
    }

    #[test]
    fn test_decode_multicall_all_success() {
        let results = vec![
            ok(encoded_string("ChainLink Token")),
            ok(encoded_string("LINK")),
            ok(U256::from(18u8).abi_encode()),
            ok(U256::from(2_500_000_000_000_000_000u128).abi_encode()),
        ];

        let info = decode_multicall(&results).unwrap();
        assert_eq!(info.name, "ChainLink Token");
        assert_eq!(info.symbol, "LINK");
        assert_eq!(info.decimals, 18);
        assert_eq!(info.balance, "2.5");
    }

    #[test]
    fn test_decode_multicall_degrades_failed_slots() {
        let results = vec![
            failed(),
            ok(encoded_string("LINK")),
            failed(),
            ok(U256::from(42u64).abi_encode()),
        ];

        let info = decode_multicall(&results).unwrap();
        assert_eq!(info.name, NOT_AVAILABLE);
        assert_eq!(info.symbol, "LINK");
        assert_eq!(info.decimals, 0);
        // formatted with the degraded decimals
        assert_eq!(info.balance, "42");
    }

    #[test]
    fn test_decode_multicall_failed_balance() {
        let results = vec![
            ok(encoded_string("ChainLink Token")),
            ok(encoded_string("LINK")),
            ok(U256::from(18u8).abi_encode()),
            failed(),
        ];

        let info = decode_multicall(&results).unwrap();
        assert_eq!(info.balance, NOT_AVAILABLE);
        assert_eq!(info.decimals, 18);
    }

    #[test]
    fn test_decode_multicall_garbage_return_data() {
        let results = vec![
            ok(vec![0xde, 0xad]),
            ok(encoded_string("LINK")),
            ok(U256::from(18u8).abi_encode()),
            ok(U256::ZERO.abi_encode()),
        ];

        let info = decode_multicall(&results).unwrap();
        assert_eq!(info.name, NOT_AVAILABLE);
        assert_eq!(info.balance, "0");
    }

    #[test]
    fn test_decode_multicall_wrong_shape() {
        let results = vec![ok(encoded_string("LINK"))];
        assert_eq!(
            decode_multicall(&results),
            Err(TokenError::MulticallShape(1))
        );
    }
}
