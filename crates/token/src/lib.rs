//! ERC20 token reads.
//!
//! This crate provides the token metadata record shown to the user, unit
//! conversion between raw amounts and display strings, and [`TokenReader`],
//! which reads metadata, balances and allowances with one of three
//! strategies (see [`ReadStrategy`]).

pub mod reader;
pub mod units;

pub use reader::TokenReader;
pub use units::{effective_decimals, format_amount, parse_amount, DEFAULT_DECIMALS};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, str::FromStr};
use thiserror::Error;

/// Placeholder for a value a batched read could not produce.
pub const NOT_AVAILABLE: &str = "N/A";

/// Token metadata and the owner's balance, as of the last successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Human readable balance, e.g. `"12.5"`
    pub balance: String,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), {} decimals, balance {}",
            self.name, self.symbol, self.decimals, self.balance
        )
    }
}

/// How token metadata and balance are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// One `eth_call` per field, in order. Any failure fails the read.
    #[default]
    Sequential,
    /// A single Multicall3 `aggregate3` call. Failed fields degrade to placeholders.
    Multicall,
    /// All four reads issued concurrently and joined.
    Joined,
}

impl FromStr for ReadStrategy {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "multicall" => Ok(Self::Multicall),
            "joined" => Ok(Self::Joined),
            other => Err(TokenError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::Multicall => "multicall",
            Self::Joined => "joined",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Amount string could not be converted to base units
    #[error("Invalid amount {amount:?}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    /// Raw amount could not be rendered with the given decimals
    #[error("Cannot format amount with {decimals} decimals: {reason}")]
    Format { decimals: u8, reason: String },

    /// Multicall returned an unexpected number of results
    #[error("Multicall returned {0} results, expected 4")]
    MulticallShape(usize),

    #[error("Unknown read strategy: {0}")]
    UnknownStrategy(String),
}

/// Trait for querying token state.
pub trait TokenQuery: Send + Sync {
    /// Read token metadata and `owner`'s balance.
    fn token_info(
        &self,
        strategy: ReadStrategy,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = eyre::Result<TokenInfo>> + Send;

    /// Read the allowance `owner` granted to `spender`.
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("sequential".parse::<ReadStrategy>(), Ok(ReadStrategy::Sequential));
        assert_eq!("Multicall".parse::<ReadStrategy>(), Ok(ReadStrategy::Multicall));
        assert_eq!("JOINED".parse::<ReadStrategy>(), Ok(ReadStrategy::Joined));
        assert_eq!(
            "batch".parse::<ReadStrategy>(),
            Err(TokenError::UnknownStrategy("batch".to_string()))
        );
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [
            ReadStrategy::Sequential,
            ReadStrategy::Multicall,
            ReadStrategy::Joined,
        ] {
            assert_eq!(strategy.to_string().parse::<ReadStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn test_token_info_display() {
        let info = TokenInfo {
            name: "ChainLink Token".to_string(),
            symbol: "LINK".to_string(),
            decimals: 18,
            balance: "25".to_string(),
        };
        assert_eq!(
            info.to_string(),
            "ChainLink Token (LINK), 18 decimals, balance 25"
        );
    }
}
