//! Quote Store Port (Driven Port)
//!
//! Interface for durable quote storage. Records are append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::quote::{Quote, QuoteRecord, TradingPair};

/// Quote store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteStoreError {
    /// Write failed.
    #[error("failed to save quote: {message}")]
    Persistence {
        /// Error details.
        message: String,
    },

    /// Read failed.
    #[error("failed to query quotes: {message}")]
    Query {
        /// Error details.
        message: String,
    },

    /// No quote stored for the pair.
    #[error("no quotes found for {pair}")]
    NotFound {
        /// Requested trading pair.
        pair: String,
    },

    /// Liveness probe failed or timed out.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for quote persistence.
#[async_trait]
pub trait QuoteStorePort: Send + Sync {
    /// Persist a quote and return the stored record.
    async fn save(
        &self,
        quote: &Quote,
        persisted_at: DateTime<Utc>,
    ) -> Result<QuoteRecord, QuoteStoreError>;

    /// Most recently persisted quote for a pair.
    async fn latest(&self, pair: &TradingPair) -> Result<QuoteRecord, QuoteStoreError>;

    /// Quotes for a pair persisted within `[start, end]`, newest first.
    async fn range(
        &self,
        pair: &TradingPair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<QuoteRecord>, QuoteStoreError>;

    /// Check that the store answers within its probe timeout.
    async fn probe_alive(&self) -> Result<(), QuoteStoreError>;

    /// Release underlying resources.
    async fn close(&self);
}
