//! In-memory quote store.
//!
//! Used for tests and local development (`QUOTE_STORE=memory`).
//! Contents are lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::application::ports::{QuoteStoreError, QuoteStorePort};
use crate::domain::quote::{Quote, QuoteRecord, TradingPair};
use crate::infrastructure::metrics;

/// Quote store held in process memory.
#[derive(Debug)]
pub struct InMemoryQuoteStore {
    records: RwLock<Vec<QuoteRecord>>,
    next_id: AtomicI64,
}

impl InMemoryQuoteStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemoryQuoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteStorePort for InMemoryQuoteStore {
    async fn save(
        &self,
        quote: &Quote,
        persisted_at: DateTime<Utc>,
    ) -> Result<QuoteRecord, QuoteStoreError> {
        let record = QuoteRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            quote: quote.clone(),
            persisted_at,
        };

        self.records.write().push(record.clone());
        metrics::record_store_write(true);

        Ok(record)
    }

    async fn latest(&self, pair: &TradingPair) -> Result<QuoteRecord, QuoteStoreError> {
        self.records
            .read()
            .iter()
            .filter(|r| r.quote.trading_pair() == pair)
            .max_by_key(|r| (r.persisted_at, r.id))
            .cloned()
            .ok_or_else(|| QuoteStoreError::NotFound {
                pair: pair.to_string(),
            })
    }

    async fn range(
        &self,
        pair: &TradingPair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<QuoteRecord>, QuoteStoreError> {
        let mut matching: Vec<QuoteRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| {
                r.quote.trading_pair() == pair && r.persisted_at >= start && r.persisted_at <= end
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| (b.persisted_at, b.id).cmp(&(a.persisted_at, a.id)));
        Ok(matching)
    }

    async fn probe_alive(&self) -> Result<(), QuoteStoreError> {
        Ok(())
    }

    async fn close(&self) {}
}
