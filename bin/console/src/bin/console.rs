//! CLI to run individual console operations.
//!
//! Each invocation performs one user operation and prints the resulting
//! session state as JSON:
//! - `connect`: ask the wallet for its accounts
//! - `network` / `switch-network`: inspect or change the wallet's chain
//! - `token-info`, `allowance`: read token state
//! - `approve`, `transfer`: submit token transactions

use alloy_primitives::Address;
use clap::{Parser, Subcommand, ValueEnum};
use client::AnyWallet;
use config::ChainConfig;
use std::path::Path;
use token::ReadStrategy;
use token_console::{config::Config, metrics::Metrics, Session};
use tracing::info;

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Inspect and move ERC20 tokens through a wallet")]
struct Cli {
    /// Path to the configuration file, presets are used when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// JSON-RPC wallet endpoint, overrides `wallet_url` from the config
    #[arg(long, env = "WALLET_RPC_URL")]
    wallet_url: Option<String>,

    /// Private key used instead of a wallet endpoint (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request the wallet's accounts
    Connect,

    /// Show the wallet's network
    Network,

    /// Switch the wallet to another network, adding it if unknown
    SwitchNetwork {
        #[arg(long, value_enum, default_value_t = Network::Sepolia)]
        network: Network,
    },

    /// Read token name, symbol, decimals and balance
    TokenInfo {
        /// Read strategy (sequential, multicall, joined), defaults to the configured one
        #[arg(long)]
        strategy: Option<ReadStrategy>,
    },

    /// Read the allowance granted to the configured spender
    Allowance,

    /// Approve the configured spender
    Approve {
        /// Amount in whole tokens, e.g. 1.5
        #[arg(long)]
        amount: String,
    },

    /// Transfer tokens
    Transfer {
        /// Recipient, defaults to the configured recipient
        #[arg(long)]
        to: Option<Address>,

        /// Amount in whole tokens, e.g. 1.5
        #[arg(long)]
        amount: String,
    },

    /// Connect, then show network, token info and allowance
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum Network {
    Sepolia,
    Mainnet,
}

impl Network {
    fn chain(self) -> ChainConfig {
        match self {
            Self::Sepolia => ChainConfig::sepolia(),
            Self::Mainnet => ChainConfig::mainnet(),
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = if Path::new(&cli.config).exists() {
        Config::from_file(&cli.config)?
    } else {
        info!(path = %cli.config, "Config file not found, using presets");
        Config::default()
    };

    let network = config.network_config();
    let rpc_url = network
        .chain
        .rpc_url()
        .ok_or_else(|| eyre::eyre!("No RPC URL configured"))?
        .to_string();

    info!("Loaded config:");
    info!("  Network: {:?} ({})", network.network_type, network.chain.chain_name);
    info!("  RPC URL: {}", rpc_url);
    info!("  Token: {}", network.token.token);
    info!("  Spender: {}", network.token.spender);

    let provider = client::create_provider(&rpc_url)?;
    let wallet_url = cli.wallet_url.as_deref().or(config.wallet_url.as_deref());
    let wallet = AnyWallet::from_options(wallet_url, cli.private_key.as_deref(), provider.clone())?;
    info!("  Wallet: {}", wallet.kind());

    let mut session = Session::new(wallet, provider, network, Metrics::new());
    let strategy = config.read_strategy;

    match cli.command {
        Command::Connect => {
            session.connect_wallet().await?;
        }
        Command::Network => {
            session.check_network().await?;
        }
        Command::SwitchNetwork { network } => {
            session.change_network(&network.chain()).await?;
        }
        Command::TokenInfo { strategy: chosen } => {
            session.connect_wallet().await?;
            session.read_token_info(chosen.unwrap_or(strategy)).await?;
        }
        Command::Allowance => {
            session.connect_wallet().await?;
            session.read_token_info(strategy).await?;
            session.read_allowance().await?;
        }
        Command::Approve { amount } => {
            session.connect_wallet().await?;
            session.read_token_info(strategy).await?;

            let status = session.approve_tokens(&amount).await;
            if let Some(error) = &status.error {
                eyre::bail!("Approve failed: {error}");
            }
            session.read_allowance().await?;
        }
        Command::Transfer { to, amount } => {
            session.connect_wallet().await?;
            session.read_token_info(strategy).await?;

            let recipient = to
                .or(Some(session.network().token.recipient))
                .filter(|recipient| !recipient.is_zero());
            match session.transfer_tokens(recipient, &amount).await {
                None => eyre::bail!("Transfer needs a recipient and an amount"),
                Some(status) => {
                    if let Some(error) = &status.error {
                        eyre::bail!("Transfer failed: {error}");
                    }
                }
            }
            session.read_token_info(strategy).await?;
        }
        Command::Status => {
            session.connect_wallet().await?;
            session.check_network().await?;
            session.read_token_info(strategy).await?;
            session.read_allowance().await?;
        }
    }

    println!("{}", serde_json::to_string_pretty(session.state())?);

    Ok(())
}
