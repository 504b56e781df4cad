//! Prometheus metrics for the console.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use token::ReadStrategy;

/// Aggregated metrics for the console.
///
/// Metrics are registered with the global metrics registry on creation.
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    /// Register metric descriptions with the global registry.
    fn register_descriptions() {
        // Read metrics
        describe_counter!(
            "token_console_reads_total",
            "Total number of token info reads by strategy"
        );
        describe_counter!(
            "token_console_read_failures_total",
            "Total number of failed token info reads by strategy"
        );

        // Transaction metrics
        describe_counter!(
            "token_console_transactions_total",
            "Total number of submitted transactions by kind"
        );
        describe_counter!(
            "token_console_transactions_confirmed_total",
            "Total number of confirmed transactions by kind"
        );
        describe_counter!(
            "token_console_transactions_failed_total",
            "Total number of failed transactions by kind"
        );

        // Token state (gauges - current values)
        describe_gauge!(
            "token_console_balance",
            "Token balance of the connected account, in whole tokens"
        );
        describe_gauge!(
            "token_console_allowance",
            "Allowance granted to the configured spender, in whole tokens"
        );
        describe_gauge!(
            "token_console_on_configured_chain",
            "1 when the wallet is on the configured chain, 0 otherwise"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a token info read.
    pub fn record_read(&self, strategy: ReadStrategy, success: bool) {
        let strategy = strategy.to_string();
        counter!("token_console_reads_total", "strategy" => strategy.clone()).increment(1);
        if !success {
            counter!("token_console_read_failures_total", "strategy" => strategy).increment(1);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a broadcast transaction.
    pub fn record_submitted(&self, kind: &'static str) {
        counter!("token_console_transactions_total", "kind" => kind).increment(1);
    }

    /// Record the outcome of an approve or transfer.
    pub fn record_outcome(&self, kind: &'static str, confirmed: bool) {
        if confirmed {
            counter!("token_console_transactions_confirmed_total", "kind" => kind).increment(1);
        } else {
            counter!("token_console_transactions_failed_total", "kind" => kind).increment(1);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Token state (gauges)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Set the current balance. Non-numeric balances ("N/A") are skipped.
    pub fn set_balance(&self, symbol: &str, balance: &str) {
        if let Ok(value) = balance.parse::<f64>() {
            gauge!("token_console_balance", "symbol" => symbol.to_string()).set(value);
        }
    }

    /// Set the current allowance.
    pub fn set_allowance(&self, allowance: &str) {
        if let Ok(value) = allowance.parse::<f64>() {
            gauge!("token_console_allowance").set(value);
        }
    }

    /// Set whether the wallet is on the configured chain.
    pub fn set_on_configured_chain(&self, on_chain: bool) {
        gauge!("token_console_on_configured_chain").set(if on_chain { 1.0 } else { 0.0 });
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
