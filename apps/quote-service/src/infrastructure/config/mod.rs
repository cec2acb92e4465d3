//! Configuration Module
//!
//! Configuration loading for the quote service: environment variables
//! (optionally from `.env`) overridden by command-line flags.

mod cli;
mod settings;

pub use cli::CliArgs;
pub use settings::{
    ConfigError, DEFAULT_TRADING_PAIR, DatabaseSettings, ExchangeSettings, LoggingSettings,
    ServerSettings, ServiceConfig, StoreBackend,
};
