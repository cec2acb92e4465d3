//! Command-line flags.
//!
//! Every flag is optional; a flag that is given wins over the matching
//! environment variable.

use clap::Parser;

/// Exchange trade quote service.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "quote-service", version, about)]
pub struct CliArgs {
    /// gRPC server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Health check and metrics HTTP port.
    #[arg(long)]
    pub health_port: Option<u16>,

    /// Database host.
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database port.
    #[arg(long)]
    pub db_port: Option<u16>,

    /// Database user.
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password.
    #[arg(long)]
    pub db_password: Option<String>,

    /// Database name.
    #[arg(long)]
    pub db_name: Option<String>,

    /// Database SSL mode (disable, prefer, require, verify-ca, verify-full).
    #[arg(long)]
    pub db_sslmode: Option<String>,

    /// Maximum database pool size.
    #[arg(long)]
    pub db_max_connections: Option<u32>,

    /// Exchange API base URL.
    #[arg(long)]
    pub exchange_base_url: Option<String>,

    /// Exchange request timeout in seconds.
    #[arg(long)]
    pub exchange_timeout_secs: Option<u64>,

    /// `User-Agent` sent to the exchange.
    #[arg(long)]
    pub exchange_user_agent: Option<String>,

    /// Number of recent trades requested per quote.
    #[arg(long)]
    pub exchange_trade_limit: Option<u32>,

    /// Trading pair to quote, e.g. USDT/RUB.
    #[arg(long)]
    pub trading_pair: Option<String>,

    /// Quote store backend (postgres or memory).
    #[arg(long)]
    pub store: Option<String>,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long)]
    pub log_level: Option<String>,
}
