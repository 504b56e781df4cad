//! Configuration types for the token console.
//!
//! This crate provides:
//! - Network configurations (mainnet, testnet)
//! - Chain parameters announced to wallets
//! - Token and counterparty addresses

pub mod network;

pub use network::{
    ChainConfig, NativeCurrency, NetworkConfig, NetworkConfigBuilder, NetworkType, TokenConfig,
    MULTICALL3,
};
