//! Quote Service Configuration Settings
//!
//! Configuration types for the quote service, loaded from environment
//! variables and optionally overridden by command-line flags.
//!
//! Empty environment values are treated as unset.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use super::cli::CliArgs;
use crate::domain::quote::{TradingPair, TradingPairError};
use crate::infrastructure::exchange::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, ExchangeClientConfig};

/// Which quote store implementation to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// `PostgreSQL` via `sqlx`.
    #[default]
    Postgres,
    /// Process memory (development only).
    Memory,
}

impl StoreBackend {
    /// Backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_port: 8080,
            health_port: 8082,
        }
    }
}

/// `PostgreSQL` connection settings.
#[derive(Clone)]
pub struct DatabaseSettings {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database user.
    pub user: String,
    password: String,
    /// Database name.
    pub name: String,
    /// TLS mode.
    pub ssl_mode: PgSslMode,
    /// Maximum pool size.
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// Database password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Replace the database password.
    pub fn set_password(&mut self, password: String) {
        self.password = password;
    }

    /// Connection options for the `sqlx` pool.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "quotes".to_string(),
            ssl_mode: PgSslMode::Disable,
            max_connections: 5,
        }
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Exchange client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSettings {
    /// Exchange API base URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Trades requested per fetch.
    pub trade_limit: u32,
}

impl ExchangeSettings {
    /// Client configuration derived from these settings.
    #[must_use]
    pub fn client_config(&self) -> ExchangeClientConfig {
        ExchangeClientConfig::new(self.base_url.clone())
            .with_timeout(self.timeout)
            .with_user_agent(self.user_agent.clone())
            .with_trade_limit(self.trade_limit)
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            trade_limit: 100,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default level filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Trading pair served.
    pub trading_pair: TradingPair,
    /// Quote store backend.
    pub store: StoreBackend,
    /// Server port settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Exchange settings.
    pub exchange: ExchangeSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Default trading pair.
pub const DEFAULT_TRADING_PAIR: &str = "USDT/RUB";

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a key maps to a value that cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            grpc_port: env.parse("SERVER_PORT", server_defaults.grpc_port)?,
            health_port: env.parse("HEALTH_PORT", server_defaults.health_port)?,
        };

        let db_defaults = DatabaseSettings::default();
        let database = DatabaseSettings {
            host: env.string("DB_HOST", db_defaults.host),
            port: env.parse("DB_PORT", db_defaults.port)?,
            user: env.string("DB_USER", db_defaults.user),
            password: env.string("DB_PASSWORD", db_defaults.password),
            name: env.string("DB_NAME", db_defaults.name),
            ssl_mode: match env.get("DB_SSLMODE") {
                Some(v) => parse_ssl_mode("DB_SSLMODE", &v)?,
                None => db_defaults.ssl_mode,
            },
            max_connections: env.parse("DB_MAX_CONNECTIONS", db_defaults.max_connections)?,
        };

        let exchange_defaults = ExchangeSettings::default();
        let exchange = ExchangeSettings {
            base_url: env.string("EXCHANGE_BASE_URL", exchange_defaults.base_url),
            timeout: env
                .get("EXCHANGE_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("EXCHANGE_TIMEOUT_SECS", &v))
                .transpose()?
                .map_or(exchange_defaults.timeout, Duration::from_secs),
            user_agent: env.string("EXCHANGE_USER_AGENT", exchange_defaults.user_agent),
            trade_limit: env.parse("EXCHANGE_TRADE_LIMIT", exchange_defaults.trade_limit)?,
        };

        let logging = LoggingSettings {
            level: env.string("LOG_LEVEL", LoggingSettings::default().level),
        };

        let trading_pair = env
            .string("TRADING_PAIR", DEFAULT_TRADING_PAIR.to_string())
            .parse::<TradingPair>()?;

        let store = match env.get("QUOTE_STORE") {
            Some(v) => parse_value("QUOTE_STORE", &v)?,
            None => StoreBackend::default(),
        };

        Ok(Self {
            trading_pair,
            store,
            server,
            database,
            exchange,
            logging,
        })
    }

    /// Apply command-line overrides on top of the environment values.
    ///
    /// # Errors
    ///
    /// Returns an error if an overriding flag value cannot be parsed.
    pub fn apply_overrides(mut self, args: &CliArgs) -> Result<Self, ConfigError> {
        if let Some(port) = args.port {
            self.server.grpc_port = port;
        }
        if let Some(port) = args.health_port {
            self.server.health_port = port;
        }
        if let Some(host) = &args.db_host {
            self.database.host.clone_from(host);
        }
        if let Some(port) = args.db_port {
            self.database.port = port;
        }
        if let Some(user) = &args.db_user {
            self.database.user.clone_from(user);
        }
        if let Some(password) = &args.db_password {
            self.database.set_password(password.clone());
        }
        if let Some(name) = &args.db_name {
            self.database.name.clone_from(name);
        }
        if let Some(mode) = &args.db_sslmode {
            self.database.ssl_mode = parse_ssl_mode("--db-sslmode", mode)?;
        }
        if let Some(max) = args.db_max_connections {
            self.database.max_connections = max;
        }
        if let Some(url) = &args.exchange_base_url {
            self.exchange.base_url.clone_from(url);
        }
        if let Some(secs) = args.exchange_timeout_secs {
            self.exchange.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = &args.exchange_user_agent {
            self.exchange.user_agent.clone_from(agent);
        }
        if let Some(limit) = args.exchange_trade_limit {
            self.exchange.trade_limit = limit;
        }
        if let Some(pair) = &args.trading_pair {
            self.trading_pair = pair.parse::<TradingPair>()?;
        }
        if let Some(store) = &args.store {
            self.store = parse_value("--store", store)?;
        }
        if let Some(level) = &args.log_level {
            self.logging.level.clone_from(level);
        }

        Ok(self)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting has a value that cannot be parsed.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable or flag name.
        key: String,
        /// Offending value.
        value: String,
        /// Parse failure detail.
        reason: String,
    },

    /// The trading pair is malformed.
    #[error(transparent)]
    InvalidTradingPair(#[from] TradingPairError),
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: String) -> String {
        self.get(key).unwrap_or(default)
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map_or(Ok(default), |v| parse_value(key, &v))
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_ssl_mode(key: &str, value: &str) -> Result<PgSslMode, ConfigError> {
    PgSslMode::from_str(value.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
