//! HTTP client for the exchange's public trade API.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::api_types::ExchangeTrade;
use super::config::ExchangeClientConfig;
use crate::application::ports::{QuoteSourceError, QuoteSourcePort};
use crate::domain::extraction::derive_quote;
use crate::domain::quote::{Quote, Trade, TradingPair};
use crate::infrastructure::metrics;

/// Exchange adapter implementing [`QuoteSourcePort`].
///
/// Requests are not retried.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    client: Client,
    base_url: String,
    user_agent: String,
    trade_limit: u32,
}

impl ExchangeClient {
    /// Create a new client from config.
    ///
    /// # Errors
    ///
    /// Returns `QuoteSourceError::Transport` if the HTTP client cannot be
    /// built (e.g. TLS backend initialisation fails).
    pub fn new(config: &ExchangeClientConfig) -> Result<Self, QuoteSourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuoteSourceError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            trade_limit: config.trade_limit,
        })
    }

    /// Fetch the most recent trades for `pair`.
    async fn fetch_trades(&self, pair: &TradingPair) -> Result<Vec<Trade>, QuoteSourceError> {
        let url = format!("{}/api/v2/trades", self.base_url);
        let market = pair.market_id();

        tracing::debug!(url = %url, market = %market, limit = self.trade_limit, "Fetching trades");

        let started = Instant::now();
        let result = self.request_trades(&url, &market).await;
        metrics::record_upstream_fetch(started.elapsed());

        let body = result?;
        let trades: Vec<ExchangeTrade> =
            serde_json::from_str(&body).map_err(|e| QuoteSourceError::Decode {
                message: e.to_string(),
            })?;

        Ok(trades.into_iter().map(Trade::from).collect())
    }

    async fn request_trades(&self, url: &str, market: &str) -> Result<String, QuoteSourceError> {
        let limit = self.trade_limit.to_string();
        let response = self
            .client
            .get(url)
            .query(&[("market", market), ("limit", limit.as_str())])
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(QuoteSourceError::UpstreamStatus {
                code: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(transport_error)
    }
}

fn transport_error(e: reqwest::Error) -> QuoteSourceError {
    QuoteSourceError::Transport {
        message: e.to_string(),
    }
}

#[async_trait]
impl QuoteSourcePort for ExchangeClient {
    async fn fetch_quote(&self, pair: &TradingPair) -> Result<Quote, QuoteSourceError> {
        let trades = self.fetch_trades(pair).await?;
        let quote = derive_quote(pair, &trades)?;

        tracing::info!(
            pair = %pair,
            ask = %quote.ask_price(),
            bid = %quote.bid_price(),
            timestamp = %quote.observed_at(),
            trades = trades.len(),
            "Fetched quote from exchange"
        );

        Ok(quote)
    }

    async fn probe_reachable(&self) -> Result<(), QuoteSourceError> {
        let url = format!("{}/api/v2/markets", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(QuoteSourceError::UpstreamStatus {
                code: status.as_u16(),
                body: String::new(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
