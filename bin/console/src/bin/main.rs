use alloy_provider::Provider;
use clap::Parser;
use client::{AnyWallet, Wallet};
use std::time::Duration;
use token::ReadStrategy;
use token_console::{
    config::Config,
    metrics::{install_prometheus_exporter, Metrics},
    Session,
};
use tokio::time;
use tracing::{error, info, warn};

/// Keep a wallet on the configured network and watch its token balance and allowance.
#[derive(Parser)]
#[command(name = "token-watch")]
struct Cli {
    /// Path to the configuration file
    #[arg(default_value = "config.toml")]
    config: String,

    /// JSON-RPC wallet endpoint, overrides `wallet_url` from the config
    #[arg(long, env = "WALLET_RPC_URL")]
    wallet_url: Option<String>,

    /// Private key used instead of a wallet endpoint
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting token watch");

    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    info!("Loading config: {:?}", current_dir.join(&cli.config));

    let config = Config::from_file(&cli.config)?;
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
    info!("  Read strategy: {}", config.read_strategy);

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!("  Metrics: 0.0.0.0:{}", port);
    }

    let provider = client::create_provider(&rpc_url)?;
    let wallet_url = cli.wallet_url.as_deref().or(config.wallet_url.as_deref());
    let wallet = AnyWallet::from_options(wallet_url, cli.private_key.as_deref(), provider.clone())?;
    info!("  Wallet: {}", wallet.kind());

    let chain = network.chain.clone();
    let mut session = Session::new(wallet, provider, network, Metrics::new());

    session.connect_wallet().await?;
    if !session.check_network().await? {
        warn!("Wallet is not on {}, switching", chain.chain_name);
        session.change_network(&chain).await?;
    }

    info!("Starting watch loop...");
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }

        tokio::select! {
            result = watch_once(&mut session, config.read_strategy) => {
                if let Err(e) = result {
                    error!("Failed to refresh token state: {}", e);
                }
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Shutting down");
    Ok(())
}

/// Re-check the network, then re-read token info and allowance.
async fn watch_once<W, P>(session: &mut Session<W, P>, strategy: ReadStrategy) -> eyre::Result<()>
where
    W: Wallet + Clone + 'static,
    P: Provider + Clone + 'static,
{
    if !session.check_network().await? {
        warn!("Wallet left the configured network");
    }

    let info = session.refresh(strategy).await?;
    info!(
        "{} balance: {}, allowance: {}",
        info.symbol,
        info.balance,
        session.state().allowance_amount
    );

    Ok(())
}
