//! Exchange client configuration.

use std::time::Duration;

/// Default exchange base URL.
pub const DEFAULT_BASE_URL: &str = "https://grinex.io";

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = "QuoteService/1.0";

/// Configuration for the exchange HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of recent trades requested per fetch.
    pub trade_limit: u32,
}

impl ExchangeClientConfig {
    /// Create a configuration for `base_url` with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the number of trades requested per fetch.
    #[must_use]
    pub const fn with_trade_limit(mut self, trade_limit: u32) -> Self {
        self.trade_limit = trade_limit;
        self
    }
}

impl Default for ExchangeClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            trade_limit: 100,
        }
    }
}
