//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks and Prometheus metrics. Used by container
//! orchestrators, load balancers, and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON composite health (503 when unhealthy)
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{QuoteSourcePort, QuoteStorePort};
use crate::application::services::QuoteService;
use crate::domain::health::{HealthReport, HealthStatus};
use crate::infrastructure::metrics::{get_metrics_handle, record_health_check};

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Explanation of the status.
    pub message: String,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    version: String,
    started_at: Instant,
    service: Arc<QuoteService<S, C>>,
}

impl<S, C> HealthServerState<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    /// Create new health server state.
    #[must_use]
    pub fn new(version: String, service: Arc<QuoteService<S, C>>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            service,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    port: u16,
    state: Arc<HealthServerState<S, C>>,
    cancel: CancellationToken,
}

impl<S, C> HealthServer<S, C>
where
    S: QuoteStorePort + 'static,
    C: QuoteSourcePort + 'static,
{
    /// Create a new health server.
    #[must_use]
    pub const fn new(
        port: u16,
        state: Arc<HealthServerState<S, C>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Build the health router.
pub fn router<S, C>(state: Arc<HealthServerState<S, C>>) -> Router
where
    S: QuoteStorePort + 'static,
    C: QuoteSourcePort + 'static,
{
    Router::new()
        .route("/health", get(health_handler::<S, C>))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler<S, C>(State(state): State<Arc<HealthServerState<S, C>>>) -> impl IntoResponse
where
    S: QuoteStorePort + 'static,
    C: QuoteSourcePort + 'static,
{
    let report = match state.service.check_health().await {
        Ok(report) => report,
        Err(e) => e.report().clone(),
    };
    record_health_check(report.status);

    let status_code = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(build_health_response(&state, report)))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response<S, C>(state: &HealthServerState<S, C>, report: HealthReport) -> HealthResponse
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    HealthResponse {
        status: report.status,
        message: report.message,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
