//! Quote Service Binary
//!
//! Starts the gRPC quote server and the HTTP health endpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-service -- --port 8080 --store memory
//! ```
//!
//! # Environment Variables
//!
//! Every variable has a matching command-line flag which takes precedence.
//!
//! - `SERVER_PORT`: gRPC server port (default: 8080)
//! - `HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSLMODE`,
//!   `DB_MAX_CONNECTIONS`: `PostgreSQL` connection
//! - `EXCHANGE_BASE_URL`: Exchange API base URL (default: <https://grinex.io>)
//! - `EXCHANGE_TIMEOUT_SECS`: Exchange request timeout (default: 30)
//! - `EXCHANGE_USER_AGENT`: `User-Agent` header (default: QuoteService/1.0)
//! - `EXCHANGE_TRADE_LIMIT`: Trades per quote (default: 100)
//! - `TRADING_PAIR`: Pair to quote (default: USDT/RUB)
//! - `QUOTE_STORE`: postgres | memory (default: postgres)
//! - `LOG_LEVEL`: Log level when `RUST_LOG` is unset (default: info)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: quote-service)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use quote_service::infrastructure::grpc::proto::quote::v1::quote_service_server::QuoteServiceServer;
use quote_service::infrastructure::telemetry;
use quote_service::{
    CliArgs, ExchangeClient, HealthServer, HealthServerState, InMemoryQuoteStore,
    PostgresQuoteStore, QuoteGrpcServer, QuoteService, QuoteStorePort, ServiceConfig,
    StoreBackend, TelemetryConfig, init_metrics,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    let args = CliArgs::parse();
    let config = ServiceConfig::from_env()?.apply_overrides(&args)?;

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard =
        telemetry::init_with_config(TelemetryConfig::from_env(&config.logging.level));

    tracing::info!("Starting Quote Service");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    log_config(&config);

    let source = Arc::new(ExchangeClient::new(&config.exchange.client_config())?);

    match config.store {
        StoreBackend::Postgres => {
            let store = PostgresQuoteStore::connect(
                config.database.connect_options(),
                config.database.max_connections,
            )
            .await?;
            run(config, Arc::new(store), source).await
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory quote store; quotes are lost on restart");
            run(config, Arc::new(InMemoryQuoteStore::new()), source).await
        }
    }
}

/// Serve until a shutdown signal arrives, then drain and close the store.
async fn run<S>(
    config: ServiceConfig,
    store: Arc<S>,
    source: Arc<ExchangeClient>,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: QuoteStorePort + 'static,
{
    let shutdown_token = CancellationToken::new();

    let service = Arc::new(QuoteService::new(
        Arc::clone(&store),
        source,
        config.trading_pair.clone(),
    ));

    // Bind the gRPC port before spawning anything so a port clash fails fast
    let grpc_addr: SocketAddr = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_listener = TcpListener::bind(grpc_addr).await?;

    // Spawn health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&service),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // Spawn gRPC server
    let grpc_service = QuoteServiceServer::new(QuoteGrpcServer::new(Arc::clone(&service)));
    let grpc_shutdown = shutdown_token.clone();
    let grpc_handle = tokio::spawn(async move {
        tracing::info!(addr = %grpc_addr, "gRPC server listening");
        if let Err(e) = Server::builder()
            .add_service(grpc_service)
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(grpc_listener),
                grpc_shutdown.cancelled_owned(),
            )
            .await
        {
            tracing::error!(error = %e, "gRPC server error");
        }
        tracing::info!("gRPC server stopped");
    });

    tracing::info!(pair = %config.trading_pair, "Quote service ready");

    await_shutdown(shutdown_token).await;

    drain(vec![grpc_handle, health_handle]).await;
    store.close().await;

    tracing::info!("Quote service stopped");
    Ok(())
}

/// Wait for server tasks to finish, aborting them after the grace period.
async fn drain(handles: Vec<JoinHandle<()>>) {
    let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

    let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        for handle in handles {
            let _ = handle.await;
        }
    })
    .await;

    if joined.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Graceful shutdown timed out, aborting in-flight requests"
        );
        for abort in aborts {
            abort.abort();
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        trading_pair = %config.trading_pair,
        store = config.store.as_str(),
        grpc_port = config.server.grpc_port,
        health_port = config.server.health_port,
        "Configuration loaded"
    );
    tracing::debug!(
        exchange_base_url = %config.exchange.base_url,
        exchange_timeout_secs = config.exchange.timeout.as_secs(),
        trade_limit = config.exchange.trade_limit,
        database = ?config.database,
        "Upstream endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
