//! gRPC Quote Server Implementation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prost::Message;
use prost_types::Timestamp;
use rust_decimal::Decimal;
use tonic::{Code, Request, Response, Status};

use super::proto::quote::v1::{
    self as proto, GetLatestQuoteRequest, GetQuoteRequest, GetQuoteResponse, HealthcheckRequest,
    HealthcheckResponse, ListQuotesRequest, ListQuotesResponse,
    quote_service_server::QuoteService as QuoteServiceRpc,
};
use crate::application::ports::{QuoteSourceError, QuoteSourcePort, QuoteStoreError, QuoteStorePort};
use crate::application::services::{HealthCheckError, QuoteService, QuoteServiceError};
use crate::domain::health::HealthReport;
use crate::domain::quote::{Quote, QuoteRecord};
use crate::infrastructure::metrics::{self, QuoteOutcome};

type RpcResult<T> = Result<Response<T>, Status>;

/// gRPC adapter over [`QuoteService`].
pub struct QuoteGrpcServer<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    service: Arc<QuoteService<S, C>>,
}

impl<S, C> QuoteGrpcServer<S, C>
where
    S: QuoteStorePort,
    C: QuoteSourcePort,
{
    /// Create a new gRPC server.
    #[must_use]
    pub const fn new(service: Arc<QuoteService<S, C>>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl<S, C> QuoteServiceRpc for QuoteGrpcServer<S, C>
where
    S: QuoteStorePort + 'static,
    C: QuoteSourcePort + 'static,
{
    async fn get_quote(&self, _request: Request<GetQuoteRequest>) -> RpcResult<GetQuoteResponse> {
        match self.service.get_quote().await {
            Ok(quote) => {
                metrics::record_quote_request(QuoteOutcome::Success);
                Ok(Response::new(quote_to_response(&quote)))
            }
            Err(e) => {
                metrics::record_quote_request(quote_outcome(&e));
                tracing::error!(error = %e, "GetQuote failed");
                Err(service_error_to_status(&e))
            }
        }
    }

    async fn get_latest_quote(
        &self,
        _request: Request<GetLatestQuoteRequest>,
    ) -> RpcResult<proto::QuoteRecord> {
        let record = self.service.latest_quote().await.map_err(|e| {
            tracing::debug!(error = %e, "GetLatestQuote failed");
            service_error_to_status(&e)
        })?;

        Ok(Response::new(record_to_proto(&record)))
    }

    async fn list_quotes(
        &self,
        request: Request<ListQuotesRequest>,
    ) -> RpcResult<ListQuotesResponse> {
        let request = request.into_inner();
        let start = required_time("start", request.start)?;
        let end = required_time("end", request.end)?;

        let records = self
            .service
            .quote_history(start, end)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "ListQuotes failed");
                service_error_to_status(&e)
            })?;

        Ok(Response::new(ListQuotesResponse {
            records: records.iter().map(record_to_proto).collect(),
        }))
    }

    async fn healthcheck(
        &self,
        _request: Request<HealthcheckRequest>,
    ) -> RpcResult<HealthcheckResponse> {
        match self.service.check_health().await {
            Ok(report) => {
                metrics::record_health_check(report.status);
                Ok(Response::new(report_to_response(&report)))
            }
            Err(e) => {
                metrics::record_health_check(e.report().status);
                Err(health_error_to_status(&e))
            }
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a service error to a gRPC status.
#[must_use]
pub fn service_error_to_status(err: &QuoteServiceError) -> Status {
    let code = match err {
        QuoteServiceError::Fetch(e) => source_error_code(e),
        QuoteServiceError::Persist(e) | QuoteServiceError::Read(e) => store_error_code(e),
    };
    Status::new(code, err.to_string())
}

const fn source_error_code(err: &QuoteSourceError) -> Code {
    match err {
        QuoteSourceError::Transport { .. } | QuoteSourceError::UpstreamStatus { .. } => {
            Code::Unavailable
        }
        QuoteSourceError::Decode { .. } => Code::Internal,
        QuoteSourceError::Extraction(_) => Code::FailedPrecondition,
    }
}

const fn store_error_code(err: &QuoteStoreError) -> Code {
    match err {
        QuoteStoreError::NotFound { .. } => Code::NotFound,
        QuoteStoreError::Unavailable { .. } => Code::Unavailable,
        QuoteStoreError::Persistence { .. } | QuoteStoreError::Query { .. } => Code::Internal,
    }
}

/// Map a health check failure to `UNAVAILABLE`, carrying the encoded
/// unhealthy `HealthcheckResponse` in the status details.
#[must_use]
pub fn health_error_to_status(err: &HealthCheckError) -> Status {
    let report = err.report();
    let details = report_to_response(report).encode_to_vec();
    Status::with_details(Code::Unavailable, report.message.clone(), details.into())
}

fn quote_outcome(err: &QuoteServiceError) -> QuoteOutcome {
    match err {
        QuoteServiceError::Fetch(QuoteSourceError::Extraction(_)) => QuoteOutcome::ExtractionError,
        QuoteServiceError::Fetch(_) => QuoteOutcome::UpstreamError,
        QuoteServiceError::Persist(_) | QuoteServiceError::Read(_) => QuoteOutcome::StoreError,
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn quote_to_response(quote: &Quote) -> GetQuoteResponse {
    GetQuoteResponse {
        trading_pair: quote.trading_pair().to_string(),
        ask_price: decimal_to_f64(quote.ask_price()),
        bid_price: decimal_to_f64(quote.bid_price()),
        timestamp: Some(datetime_to_timestamp(quote.observed_at())),
    }
}

fn record_to_proto(record: &QuoteRecord) -> proto::QuoteRecord {
    proto::QuoteRecord {
        id: record.id,
        trading_pair: record.quote.trading_pair().to_string(),
        ask_price: decimal_to_f64(record.quote.ask_price()),
        bid_price: decimal_to_f64(record.quote.bid_price()),
        timestamp: Some(datetime_to_timestamp(record.quote.observed_at())),
        persisted_at: Some(datetime_to_timestamp(record.persisted_at)),
    }
}

fn report_to_response(report: &HealthReport) -> HealthcheckResponse {
    HealthcheckResponse {
        status: report.status.as_str().to_string(),
        message: report.message.clone(),
    }
}

fn datetime_to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: i32::try_from(dt.timestamp_subsec_nanos()).unwrap_or(i32::MAX),
    }
}

fn timestamp_to_datetime(ts: &Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}

fn required_time(field: &str, ts: Option<Timestamp>) -> Result<DateTime<Utc>, Status> {
    let ts = ts.ok_or_else(|| Status::invalid_argument(format!("{field} is required")))?;
    timestamp_to_datetime(&ts)
        .ok_or_else(|| Status::invalid_argument(format!("{field} is out of range")))
}

fn decimal_to_f64(d: Decimal) -> f64 {
    use std::str::FromStr;
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::ExtractionError;
    use crate::domain::health::HealthStatus;
    use crate::domain::quote::TradingPair;
    use crate::infrastructure::persistence::InMemoryQuoteStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    struct FixedSource {
        quote: Option<Quote>,
    }

    #[async_trait]
    impl QuoteSourcePort for FixedSource {
        async fn fetch_quote(&self, _pair: &TradingPair) -> Result<Quote, QuoteSourceError> {
            self.quote
                .clone()
                .ok_or(QuoteSourceError::Extraction(ExtractionError::EmptyInput))
        }

        async fn probe_reachable(&self) -> Result<(), QuoteSourceError> {
            Ok(())
        }
    }

    fn usdt_rub() -> TradingPair {
        TradingPair::new("USDT", "RUB").unwrap()
    }

    fn sample_quote() -> Quote {
        Quote::new(
            usdt_rub(),
            dec!(81.30),
            dec!(81.20),
            Utc.with_ymd_and_hms(2025, 7, 28, 18, 22, 14).unwrap(),
        )
        .unwrap()
    }

    fn server(quote: Option<Quote>) -> QuoteGrpcServer<InMemoryQuoteStore, FixedSource> {
        let service = QuoteService::new(
            Arc::new(InMemoryQuoteStore::new()),
            Arc::new(FixedSource { quote }),
            usdt_rub(),
        );
        QuoteGrpcServer::new(Arc::new(service))
    }

    fn fetch(e: QuoteSourceError) -> QuoteServiceError {
        QuoteServiceError::Fetch(e)
    }

    #[test_case(fetch(QuoteSourceError::Transport { message: "refused".into() }), Code::Unavailable ; "transport")]
    #[test_case(fetch(QuoteSourceError::UpstreamStatus { code: 500, body: String::new() }), Code::Unavailable ; "upstream status")]
    #[test_case(fetch(QuoteSourceError::Decode { message: "eof".into() }), Code::Internal ; "decode")]
    #[test_case(fetch(QuoteSourceError::Extraction(ExtractionError::EmptyInput)), Code::FailedPrecondition ; "empty input")]
    #[test_case(fetch(QuoteSourceError::Extraction(ExtractionError::NoValidPrices { count: 3 })), Code::FailedPrecondition ; "no valid prices")]
    #[test_case(QuoteServiceError::Persist(QuoteStoreError::Persistence { message: "x".into() }), Code::Internal ; "persistence")]
    #[test_case(QuoteServiceError::Read(QuoteStoreError::Query { message: "x".into() }), Code::Internal ; "query")]
    #[test_case(QuoteServiceError::Read(QuoteStoreError::NotFound { pair: "USDT/RUB".into() }), Code::NotFound ; "not found")]
    fn error_codes(err: QuoteServiceError, expected: Code) {
        assert_eq!(service_error_to_status(&err).code(), expected);
    }

    #[test]
    fn health_error_carries_report_in_details() {
        let report = HealthReport {
            status: HealthStatus::Unhealthy,
            message: "store health check failed: timeout".to_string(),
        };
        let err = HealthCheckError::StoreUnavailable {
            report,
            source: QuoteStoreError::Unavailable {
                message: "timeout".to_string(),
            },
        };

        let status = health_error_to_status(&err);

        assert_eq!(status.code(), Code::Unavailable);
        assert_eq!(status.message(), "store health check failed: timeout");
        let decoded = HealthcheckResponse::decode(status.details()).unwrap();
        assert_eq!(decoded.status, "unhealthy");
        assert_eq!(decoded.message, "store health check failed: timeout");
    }

    #[test]
    fn timestamp_conversion() {
        let dt = Utc.with_ymd_and_hms(2025, 7, 28, 18, 22, 14).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);

        let ts = datetime_to_timestamp(dt);
        assert_eq!(ts.seconds, dt.timestamp());
        assert_eq!(ts.nanos, 123_456_789);
        assert_eq!(timestamp_to_datetime(&ts), Some(dt));

        let negative = Timestamp {
            seconds: 0,
            nanos: -1,
        };
        assert_eq!(timestamp_to_datetime(&negative), None);
    }

    #[tokio::test]
    async fn get_quote_returns_prices_as_doubles() {
        let response = server(Some(sample_quote()))
            .get_quote(Request::new(GetQuoteRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.trading_pair, "USDT/RUB");
        assert!((response.ask_price - 81.30).abs() < f64::EPSILON);
        assert!((response.bid_price - 81.20).abs() < f64::EPSILON);
        assert_eq!(
            response.timestamp,
            Some(Timestamp {
                seconds: 1_753_726_934,
                nanos: 0
            })
        );
    }

    #[tokio::test]
    async fn get_quote_failure_maps_to_failed_precondition() {
        let status = server(None)
            .get_quote(Request::new(GetQuoteRequest {}))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn list_quotes_requires_bounds() {
        let status = server(None)
            .list_quotes(Request::new(ListQuotesRequest {
                start: None,
                end: Some(datetime_to_timestamp(Utc::now())),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn latest_quote_after_get_quote() {
        let server = server(Some(sample_quote()));

        let missing = server
            .get_latest_quote(Request::new(GetLatestQuoteRequest {}))
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Code::NotFound);

        server
            .get_quote(Request::new(GetQuoteRequest {}))
            .await
            .unwrap();

        let latest = server
            .get_latest_quote(Request::new(GetLatestQuoteRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(latest.id, 1);
        assert_eq!(latest.trading_pair, "USDT/RUB");
        assert!(latest.persisted_at.is_some());
    }

    #[tokio::test]
    async fn healthcheck_reports_healthy() {
        let response = server(None)
            .healthcheck(Request::new(HealthcheckRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.status, "healthy");
        assert_eq!(response.message, "service is healthy");
    }
}
