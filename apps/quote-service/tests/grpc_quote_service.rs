//! gRPC Quote Service Integration Tests
//!
//! Runs the real gRPC server against an in-memory store and a mocked
//! exchange, and exercises it through the generated client.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prost::Message;
use serde_json::json;
use tonic::transport::{Channel, Server};
use tonic::{Code, Request};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quote_service::{
    ExchangeClient, ExchangeClientConfig, InMemoryQuoteStore, Quote, QuoteGrpcServer, QuoteRecord,
    QuoteService, QuoteStoreError, QuoteStorePort, TradingPair,
    proto::{
        GetLatestQuoteRequest, GetQuoteRequest, HealthcheckRequest, HealthcheckResponse,
        ListQuotesRequest, quote_service_client::QuoteServiceClient,
        quote_service_server::QuoteServiceServer,
    },
};

fn usdt_rub() -> TradingPair {
    TradingPair::new("USDT", "RUB").unwrap()
}

/// Start a test gRPC server on a random port and return the client.
async fn setup_test_server<S>(
    store: S,
    exchange: &MockServer,
) -> (QuoteServiceClient<Channel>, tokio::task::JoinHandle<()>)
where
    S: QuoteStorePort + 'static,
{
    let source = ExchangeClient::new(
        &ExchangeClientConfig::new(exchange.uri()).with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let service = QuoteService::new(Arc::new(store), Arc::new(source), usdt_rub());
    let server = QuoteGrpcServer::new(Arc::new(service));

    // Find an available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_handle = tokio::spawn(async move {
        Server::builder()
            .add_service(QuoteServiceServer::new(server))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = QuoteServiceClient::connect(format!("http://{addr}"))
        .await
        .unwrap();

    (client, server_handle)
}

async fn mount_trades(exchange: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v2/trades"))
        .and(query_param("market", "usdtrub"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(exchange)
        .await;
}

async fn mount_markets(exchange: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/v2/markets"))
        .respond_with(ResponseTemplate::new(status).set_body_string("[]"))
        .mount(exchange)
        .await;
}

fn sample_trades() -> serde_json::Value {
    json!([
        { "id": 3, "price": "81.40", "volume": "10", "created_at": "2025-07-28T18:22:14Z" },
        { "id": 2, "price": "80.95", "volume": "5", "created_at": "2025-07-28T18:21:50Z" },
        { "id": 1, "price": "81.10", "volume": "7", "created_at": "2025-07-28T18:20:03Z" }
    ])
}

/// Store that is unreachable for every operation.
struct UnreachableStore;

#[async_trait]
impl QuoteStorePort for UnreachableStore {
    async fn save(
        &self,
        _quote: &Quote,
        _persisted_at: DateTime<Utc>,
    ) -> Result<QuoteRecord, QuoteStoreError> {
        Err(QuoteStoreError::Persistence {
            message: "connection refused".to_string(),
        })
    }

    async fn latest(&self, _pair: &TradingPair) -> Result<QuoteRecord, QuoteStoreError> {
        Err(QuoteStoreError::Query {
            message: "connection refused".to_string(),
        })
    }

    async fn range(
        &self,
        _pair: &TradingPair,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<QuoteRecord>, QuoteStoreError> {
        Err(QuoteStoreError::Query {
            message: "connection refused".to_string(),
        })
    }

    async fn probe_alive(&self) -> Result<(), QuoteStoreError> {
        Err(QuoteStoreError::Unavailable {
            message: "connection refused".to_string(),
        })
    }

    async fn close(&self) {}
}

// =============================================================================
// GetQuote Tests
// =============================================================================

#[tokio::test]
async fn test_get_quote_derives_ask_and_bid() {
    let exchange = MockServer::start().await;
    mount_trades(&exchange, sample_trades()).await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let response = client
        .get_quote(Request::new(GetQuoteRequest {}))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.trading_pair, "USDT/RUB");
    assert!((response.ask_price - 81.40).abs() < 1e-9);
    assert!((response.bid_price - 80.95).abs() < 1e-9);
    let ts = response.timestamp.unwrap();
    assert_eq!(
        DateTime::from_timestamp(ts.seconds, 0).unwrap(),
        "2025-07-28T18:22:14Z".parse::<DateTime<Utc>>().unwrap()
    );

    handle.abort();
}

#[tokio::test]
async fn test_get_quote_upstream_failure_is_unavailable() {
    let exchange = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/trades"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&exchange)
        .await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let status = client
        .get_quote(Request::new(GetQuoteRequest {}))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unavailable);
    assert!(status.message().contains("failed to fetch quote from exchange"));

    handle.abort();
}

#[tokio::test]
async fn test_get_quote_store_failure_returns_no_quote() {
    let exchange = MockServer::start().await;
    mount_trades(&exchange, sample_trades()).await;
    let (mut client, handle) = setup_test_server(UnreachableStore, &exchange).await;

    let status = client
        .get_quote(Request::new(GetQuoteRequest {}))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("failed to persist quote"));

    handle.abort();
}

// =============================================================================
// Stored Quote Tests
// =============================================================================

#[tokio::test]
async fn test_latest_quote_not_found_then_found() {
    let exchange = MockServer::start().await;
    mount_trades(&exchange, sample_trades()).await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let status = client
        .get_latest_quote(Request::new(GetLatestQuoteRequest {}))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    client
        .get_quote(Request::new(GetQuoteRequest {}))
        .await
        .unwrap();

    let record = client
        .get_latest_quote(Request::new(GetLatestQuoteRequest {}))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(record.id, 1);
    assert_eq!(record.trading_pair, "USDT/RUB");
    assert!((record.ask_price - 81.40).abs() < 1e-9);
    assert!(record.persisted_at.is_some());

    handle.abort();
}

#[tokio::test]
async fn test_list_quotes_returns_saved_quotes_in_window() {
    let exchange = MockServer::start().await;
    mount_trades(&exchange, sample_trades()).await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let start = Utc::now() - chrono::Duration::minutes(1);
    for _ in 0..3 {
        client
            .get_quote(Request::new(GetQuoteRequest {}))
            .await
            .unwrap();
    }
    let end = Utc::now() + chrono::Duration::minutes(1);

    let response = client
        .list_quotes(Request::new(ListQuotesRequest {
            start: Some(prost_types::Timestamp {
                seconds: start.timestamp(),
                nanos: 0,
            }),
            end: Some(prost_types::Timestamp {
                seconds: end.timestamp(),
                nanos: 0,
            }),
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.records.len(), 3);

    handle.abort();
}

#[tokio::test]
async fn test_list_quotes_without_bounds_is_invalid() {
    let exchange = MockServer::start().await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let status = client
        .list_quotes(Request::new(ListQuotesRequest {
            start: None,
            end: None,
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);

    handle.abort();
}

// =============================================================================
// Healthcheck Tests
// =============================================================================

#[tokio::test]
async fn test_healthcheck_healthy() {
    let exchange = MockServer::start().await;
    mount_markets(&exchange, 200).await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let response = client
        .healthcheck(Request::new(HealthcheckRequest {}))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.status, "healthy");
    assert_eq!(response.message, "service is healthy");

    handle.abort();
}

#[tokio::test]
async fn test_healthcheck_degraded_when_exchange_down() {
    let exchange = MockServer::start().await;
    mount_markets(&exchange, 503).await;
    let (mut client, handle) = setup_test_server(InMemoryQuoteStore::new(), &exchange).await;

    let response = client
        .healthcheck(Request::new(HealthcheckRequest {}))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.status, "degraded");
    assert!(response.message.starts_with("exchange health check failed: "));

    handle.abort();
}

#[tokio::test]
async fn test_healthcheck_unhealthy_when_store_down() {
    let exchange = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/markets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&exchange)
        .await;
    let (mut client, handle) = setup_test_server(UnreachableStore, &exchange).await;

    let status = client
        .healthcheck(Request::new(HealthcheckRequest {}))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unavailable);
    assert_eq!(
        status.message(),
        "store health check failed: store unavailable: connection refused"
    );

    let details = HealthcheckResponse::decode(status.details()).unwrap();
    assert_eq!(details.status, "unhealthy");
    assert_eq!(details.message, status.message());

    handle.abort();
}
