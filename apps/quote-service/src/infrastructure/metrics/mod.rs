//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Requests**: `GetQuote` outcomes
//! - **Upstream**: Exchange fetch latency
//! - **Storage**: Quote write outcomes
//! - **Health**: Health check results by status
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::health::HealthStatus;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "quote_service_quote_requests_total",
        "Total GetQuote requests by outcome"
    );
    describe_histogram!(
        "quote_service_upstream_fetch_seconds",
        "Time to fetch recent trades from the exchange"
    );
    describe_counter!(
        "quote_service_store_writes_total",
        "Total quote writes by outcome"
    );
    describe_counter!(
        "quote_service_health_checks_total",
        "Total health checks by resulting status"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for a `GetQuote` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteOutcome {
    /// Quote fetched and persisted.
    Success,
    /// Exchange unreachable or answered with an error.
    UpstreamError,
    /// Trades received but no quote could be derived.
    ExtractionError,
    /// Quote could not be persisted.
    StoreError,
}

impl QuoteOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UpstreamError => "upstream_error",
            Self::ExtractionError => "extraction_error",
            Self::StoreError => "store_error",
        }
    }
}

/// Record a `GetQuote` request outcome.
pub fn record_quote_request(outcome: QuoteOutcome) {
    counter!(
        "quote_service_quote_requests_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record how long an exchange fetch took, successful or not.
pub fn record_upstream_fetch(duration: Duration) {
    histogram!("quote_service_upstream_fetch_seconds").record(duration.as_secs_f64());
}

/// Record a store write.
pub fn record_store_write(success: bool) {
    counter!(
        "quote_service_store_writes_total",
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// Record a health check result.
pub fn record_health_check(status: HealthStatus) {
    counter!(
        "quote_service_health_checks_total",
        "status" => status.as_str()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_outcome_as_str() {
        assert_eq!(QuoteOutcome::Success.as_str(), "success");
        assert_eq!(QuoteOutcome::UpstreamError.as_str(), "upstream_error");
        assert_eq!(QuoteOutcome::ExtractionError.as_str(), "extraction_error");
        assert_eq!(QuoteOutcome::StoreError.as_str(), "store_error");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_quote_request(QuoteOutcome::Success);
        record_upstream_fetch(Duration::from_millis(12));
        record_store_write(false);
        record_health_check(HealthStatus::Degraded);
    }
}
