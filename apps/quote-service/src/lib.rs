#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::items_after_statements,
        clippy::panic
    )
)]

//! Quote Service - Exchange Trade Quotes over gRPC
//!
//! Fetches the most recent trades for one trading pair from the exchange,
//! derives an ask/bid quote (ask = highest trade price, bid = lowest),
//! persists it and returns it. A composite health check reports whether
//! the store and the exchange are reachable.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Quote types and pure rules
//!   - `quote`: Trading pair, trade, quote and stored record
//!   - `extraction`: Ask/bid derivation from a trade window
//!   - `health`: Health status model and combinator
//!
//! - **Application**: Ports and orchestration
//!   - `ports`: Quote source and quote store interfaces
//!   - `services`: `QuoteService` (get quote, health, history)
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `exchange`: Exchange REST client
//!   - `persistence`: `PostgreSQL` and in-memory stores
//!   - `grpc`: gRPC server implementation
//!   - `health`: Health check and metrics HTTP endpoint
//!   - `config`, `telemetry`, `metrics`
//!
//! # Data Flow
//!
//! ```text
//! gRPC client ──► QuoteGrpcServer ──► QuoteService ──► ExchangeClient ──► exchange
//!                                          │
//!                                          └──► QuoteStore ──► PostgreSQL
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote types and rules with no I/O.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::extraction::{ExtractionError, derive_quote, extract_prices};
pub use domain::health::{HealthReport, HealthStatus};
pub use domain::quote::{Quote, QuoteRecord, Trade, TradingPair};

// Application
pub use application::ports::{QuoteSourceError, QuoteSourcePort, QuoteStoreError, QuoteStorePort};
pub use application::services::{HealthCheckError, QuoteService, QuoteServiceError};

// Infrastructure config
pub use infrastructure::config::{CliArgs, ConfigError, ServiceConfig, StoreBackend};

// Adapters
pub use infrastructure::exchange::{ExchangeClient, ExchangeClientConfig};
pub use infrastructure::persistence::{InMemoryQuoteStore, PostgresQuoteStore};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// gRPC server (for integration tests)
pub use infrastructure::grpc::{proto::quote::v1 as proto, server::QuoteGrpcServer};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init_with_config as init_telemetry};
