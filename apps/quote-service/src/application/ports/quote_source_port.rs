//! Quote Source Port (Driven Port)
//!
//! Interface for obtaining a freshly derived quote from an upstream market.

use async_trait::async_trait;

use crate::domain::extraction::ExtractionError;
use crate::domain::quote::{Quote, TradingPair};

/// Quote source error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteSourceError {
    /// Request could not be sent, timed out, or the body could not be read.
    #[error("exchange request failed: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// Exchange answered with a non-success status.
    #[error("exchange returned status {code}: {body}")]
    UpstreamStatus {
        /// HTTP status code.
        code: u16,
        /// Response body as received.
        body: String,
    },

    /// Response body was not valid trade JSON.
    #[error("failed to decode exchange response: {message}")]
    Decode {
        /// Error details.
        message: String,
    },

    /// Trades were received but no quote could be derived.
    #[error("failed to extract prices: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Port for the upstream quote source.
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Fetch recent trades for `pair` and derive a quote from them.
    async fn fetch_quote(&self, pair: &TradingPair) -> Result<Quote, QuoteSourceError>;

    /// Check that the upstream answers at all.
    async fn probe_reachable(&self) -> Result<(), QuoteSourceError>;
}
