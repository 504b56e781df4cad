//! Network configuration for token interactions.
//!
//! Provides chain-specific parameters and token addresses for different
//! networks (mainnet, testnet).

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Multicall3 deployment address, identical on Ethereum mainnet and Sepolia.
pub const MULTICALL3: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// Native currency of a chain, as announced to wallets on `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Chain parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Human readable chain name
    pub chain_name: String,
    /// Native currency description
    pub native_currency: NativeCurrency,
    /// Public RPC endpoints, first one is used by default
    pub rpc_urls: Vec<String>,
    /// Block explorers
    pub block_explorer_urls: Vec<String>,
    /// Multicall3 contract address
    pub multicall3: Address,
}

impl ChainConfig {
    /// Ethereum mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            chain_name: "Ethereum".to_string(),
            native_currency: NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://ethereum-rpc.publicnode.com".to_string()],
            block_explorer_urls: vec!["https://etherscan.io".to_string()],
            multicall3: MULTICALL3,
        }
    }

    /// Ethereum Sepolia testnet configuration.
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            chain_name: "Sepolia".to_string(),
            native_currency: NativeCurrency {
                name: "Sepolia".to_string(),
                symbol: "SEPOLIA".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://ethereum-sepolia.publicnode.com".to_string()],
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
            multicall3: MULTICALL3,
        }
    }

    /// Chain ID in the `0x`-prefixed hex form wallets expect.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Default RPC endpoint.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }
}

/// Token and counterparties the console works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// ERC20 token contract
    pub token: Address,
    /// Spender granted an allowance by `approve`
    pub spender: Address,
    /// Default transfer recipient
    pub recipient: Address,
}

impl TokenConfig {
    /// Mainnet LINK with no default counterparties.
    pub const fn mainnet() -> Self {
        Self {
            // https://etherscan.io/address/0x514910771AF9Ca656af840dff83E8264EcF986CA
            token: address!("0x514910771AF9Ca656af840dff83E8264EcF986CA"),
            spender: Address::ZERO,
            recipient: Address::ZERO,
        }
    }

    /// Sepolia LINK test token.
    pub const fn sepolia() -> Self {
        Self {
            // https://sepolia.etherscan.io/address/0x779877A7B0D9E8603169DdbD7836e478b4624789
            token: address!("0x779877A7B0D9E8603169DdbD7836e478b4624789"),
            spender: address!("0x83862cd294292Ffc7fB84fE10717Ba88C199Bc53"),
            recipient: address!("0x87028e52304A3d58D6d48DC5a864815Ab70fB6F5"),
        }
    }
}

/// Complete network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    /// Chain parameters
    pub chain: ChainConfig,
    /// Token addresses
    pub token: TokenConfig,
}

impl NetworkConfig {
    /// Create mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            chain: ChainConfig::mainnet(),
            token: TokenConfig::mainnet(),
        }
    }

    /// Create testnet (Sepolia) configuration.
    pub fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            chain: ChainConfig::sepolia(),
            token: TokenConfig::sepolia(),
        }
    }

    /// Create configuration from network type.
    pub fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::sepolia(),
        }
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    network_type: NetworkType,
    chain: ChainConfig,
    token: TokenConfig,
}

impl NetworkConfigBuilder {
    /// Start with mainnet defaults.
    pub fn mainnet() -> Self {
        Self::from(NetworkConfig::mainnet())
    }

    /// Start with testnet defaults.
    pub fn testnet() -> Self {
        Self::from(NetworkConfig::sepolia())
    }

    /// Override the token address.
    pub const fn token(mut self, address: Address) -> Self {
        self.token.token = address;
        self
    }

    /// Override the approval spender.
    pub const fn spender(mut self, address: Address) -> Self {
        self.token.spender = address;
        self
    }

    /// Override the default transfer recipient.
    pub const fn recipient(mut self, address: Address) -> Self {
        self.token.recipient = address;
        self
    }

    /// Override the Multicall3 address.
    pub const fn multicall3(mut self, address: Address) -> Self {
        self.chain.multicall3 = address;
        self
    }

    /// Put an RPC endpoint in front of the preset ones.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.chain.rpc_urls.insert(0, url.into());
        self
    }

    /// Build the network configuration.
    pub fn build(self) -> NetworkConfig {
        NetworkConfig {
            network_type: self.network_type,
            chain: self.chain,
            token: self.token,
        }
    }
}

impl From<NetworkConfig> for NetworkConfigBuilder {
    fn from(config: NetworkConfig) -> Self {
        Self {
            network_type: config.network_type,
            chain: config.chain,
            token: config.token,
        }
    }
}
