use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use token::ReadStrategy;

const fn default_network() -> NetworkType {
    NetworkType::Testnet
}

const fn default_poll_interval_secs() -> u64 {
    30
}

/// Top-level console configuration.
///
/// Everything but the network is optional and falls back to the network
/// preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network preset
    #[serde(default = "default_network")]
    pub network: NetworkType,

    /// RPC endpoint url, overrides the preset endpoint
    pub rpc_url: Option<String>,

    /// JSON-RPC wallet endpoint url
    pub wallet_url: Option<String>,

    /// ERC20 token address override
    pub token: Option<Address>,

    /// Approval spender override
    pub spender: Option<Address>,

    /// Default transfer recipient override
    pub recipient: Option<Address>,

    /// How token info is read
    #[serde(default)]
    pub read_strategy: ReadStrategy,

    /// Watch loop interval
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Prometheus exporter port, exporter disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            rpc_url: None,
            wallet_url: None,
            token: None,
            spender: None,
            recipient: None,
            read_strategy: ReadStrategy::default(),
            poll_interval_secs: default_poll_interval_secs(),
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn parse(contents: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(contents)?;

        if config.poll_interval_secs == 0 {
            eyre::bail!("poll_interval_secs must be greater than zero");
        }

        Ok(config)
    }

    /// Network preset with this config's overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let mut builder =
            NetworkConfigBuilder::from(NetworkConfig::from_network_type(self.network));

        if let Some(url) = &self.rpc_url {
            builder = builder.rpc_url(url.clone());
        }
        if let Some(token) = self.token {
            builder = builder.token(token);
        }
        if let Some(spender) = self.spender {
            builder = builder.spender(spender);
        }
        if let Some(recipient) = self.recipient {
            builder = builder.recipient(recipient);
        }

        builder.build()
    }
}
