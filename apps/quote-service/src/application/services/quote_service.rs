//! Quote Service
//!
//! Orchestrates the quote source and the quote store for the configured
//! trading pair.
//!
//! `get_quote` is all-or-nothing: a quote is only returned once it has been
//! persisted. `check_health` probes the store first and only consults the
//! exchange when the store is reachable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::application::ports::{QuoteSourceError, QuoteSourcePort, QuoteStoreError, QuoteStorePort};
use crate::domain::health::{HealthReport, HealthStatus, Probe, combine};
use crate::domain::quote::{Quote, QuoteRecord, TradingPair};

/// Quote service error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteServiceError {
    /// Fetching or deriving the quote failed.
    #[error("failed to fetch quote from exchange: {0}")]
    Fetch(#[source] QuoteSourceError),

    /// The derived quote could not be stored.
    #[error("failed to persist quote: {0}")]
    Persist(#[source] QuoteStoreError),

    /// Reading stored quotes failed.
    #[error("failed to read quotes: {0}")]
    Read(#[source] QuoteStoreError),
}

/// Health check failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HealthCheckError {
    /// The store did not answer its liveness probe.
    #[error("{}", .report.message)]
    StoreUnavailable {
        /// Unhealthy report describing the failure.
        report: HealthReport,
        /// Underlying store error.
        #[source]
        source: QuoteStoreError,
    },
}

impl HealthCheckError {
    /// The unhealthy report carried by this error.
    #[must_use]
    pub const fn report(&self) -> &HealthReport {
        match self {
            Self::StoreUnavailable { report, .. } => report,
        }
    }
}

/// Quote orchestration for a single trading pair.
pub struct QuoteService<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    store: Arc<S>,
    source: Arc<C>,
    pair: TradingPair,
}

impl<S, C> QuoteService<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    /// Create a new `QuoteService`.
    pub const fn new(store: Arc<S>, source: Arc<C>, pair: TradingPair) -> Self {
        Self {
            store,
            source,
            pair,
        }
    }

    /// Fetch a fresh quote, persist it, and return it.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Fetch` if the exchange call or price
    /// extraction fails and `QuoteServiceError::Persist` if the quote could
    /// not be stored. No quote is returned in either case.
    #[instrument(skip(self), fields(pair = %self.pair))]
    pub async fn get_quote(&self) -> Result<Quote, QuoteServiceError> {
        let quote = self
            .source
            .fetch_quote(&self.pair)
            .await
            .map_err(QuoteServiceError::Fetch)?;

        debug!(
            ask = %quote.ask_price(),
            bid = %quote.bid_price(),
            observed_at = %quote.observed_at(),
            "Derived quote"
        );

        let record = self
            .store
            .save(&quote, Utc::now())
            .await
            .map_err(QuoteServiceError::Persist)?;

        info!(
            id = record.id,
            ask = %record.quote.ask_price(),
            bid = %record.quote.bid_price(),
            "Quote persisted"
        );

        Ok(record.quote)
    }

    /// Composite health of the store and the exchange.
    ///
    /// # Errors
    ///
    /// Returns `HealthCheckError::StoreUnavailable`, carrying the unhealthy
    /// report, when the store liveness probe fails. The exchange is not
    /// probed in that case.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> Result<HealthReport, HealthCheckError> {
        if let Err(source) = self.store.probe_alive().await {
            let report = combine(Some(source.to_string().as_str()), &Probe::Skipped);
            warn!(error = %source, "Store health check failed");
            return Err(HealthCheckError::StoreUnavailable { report, source });
        }

        let exchange = match self.source.probe_reachable().await {
            Ok(()) => Probe::Passed,
            Err(e) => {
                warn!(error = %e, "Exchange health check failed");
                Probe::Failed(e.to_string())
            }
        };

        let report = combine(None, &exchange);
        if report.status == HealthStatus::Healthy {
            debug!("Health check passed");
        }
        Ok(report)
    }

    /// Most recently persisted quote for the configured pair.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Read` wrapping `QuoteStoreError::NotFound`
    /// when nothing has been stored yet, or the underlying query error.
    #[instrument(skip(self), fields(pair = %self.pair))]
    pub async fn latest_quote(&self) -> Result<QuoteRecord, QuoteServiceError> {
        self.store
            .latest(&self.pair)
            .await
            .map_err(QuoteServiceError::Read)
    }

    /// Persisted quotes for the configured pair within `[start, end]`,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuoteServiceError::Read` if the store query fails.
    #[instrument(skip(self), fields(pair = %self.pair))]
    pub async fn quote_history(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<QuoteRecord>, QuoteServiceError> {
        self.store
            .range(&self.pair, start, end)
            .await
            .map_err(QuoteServiceError::Read)
    }
}

// =============================================================================
// Tests
// =============================================================================
