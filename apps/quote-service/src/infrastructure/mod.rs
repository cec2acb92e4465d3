//! Infrastructure Layer - Adapters to external systems.
//!
//! - `exchange`: HTTP client for the exchange trade API
//! - `persistence`: `PostgreSQL` and in-memory quote stores
//! - `grpc`: gRPC transport for the quote service
//! - `health`: HTTP health and metrics endpoint
//! - `config`: Environment and command-line configuration
//! - `telemetry`: Logging and OpenTelemetry tracing
//! - `metrics`: Prometheus metrics

pub mod config;
pub mod exchange;
pub mod grpc;
pub mod health;
pub mod metrics;
pub mod persistence;
pub mod telemetry;
