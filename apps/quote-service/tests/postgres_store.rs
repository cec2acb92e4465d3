//! `PostgreSQL` Quote Store Integration Tests
//!
//! Requires a reachable database in `TEST_DATABASE_URL`; each test returns
//! early when it is unset.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, SubsecRound, Utc};
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;

use quote_service::infrastructure::persistence::initialize_schema;
use quote_service::{PostgresQuoteStore, Quote, QuoteStoreError, QuoteStorePort, TradingPair};

async fn setup_store() -> Option<PostgresQuoteStore> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    initialize_schema(&pool).await.unwrap();

    Some(PostgresQuoteStore::with_pool(pool))
}

/// Pair unique to one test run so tests do not see each other's rows.
fn unique_pair() -> TradingPair {
    let suffix = Utc::now().timestamp_nanos_opt().unwrap() % 1_000_000_000;
    TradingPair::new(&format!("T{suffix}"), "RUB").unwrap()
}

#[tokio::test]
async fn test_probe_alive() {
    let Some(store) = setup_store().await else {
        return;
    };

    store.probe_alive().await.unwrap();
}

#[tokio::test]
async fn test_latest_without_rows_is_not_found() {
    let Some(store) = setup_store().await else {
        return;
    };

    let err = store.latest(&unique_pair()).await.unwrap_err();
    assert!(matches!(err, QuoteStoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_save_then_latest_round_trip() {
    let Some(store) = setup_store().await else {
        return;
    };
    let pair = unique_pair();
    let observed_at = Utc::now() - Duration::seconds(5);

    let quote = Quote::new(pair.clone(), dec!(81.123456789), dec!(80.5), observed_at).unwrap();
    let saved = store.save(&quote, Utc::now()).await.unwrap();

    // NUMERIC(20, 8) keeps eight decimal places
    assert_eq!(saved.quote.ask_price(), dec!(81.12345679));
    assert_eq!(saved.quote.bid_price(), dec!(80.5));

    let latest = store.latest(&pair).await.unwrap();
    assert_eq!(latest, saved);
}

#[tokio::test]
async fn test_range_is_inclusive_and_newest_first() {
    let Some(store) = setup_store().await else {
        return;
    };
    let pair = unique_pair();
    // Stored timestamps have microsecond precision
    let base = Utc::now().trunc_subsecs(6);

    let mut ids = Vec::new();
    for offset in 0..3 {
        let quote = Quote::new(pair.clone(), dec!(82), dec!(81), base).unwrap();
        let record = store
            .save(&quote, base + Duration::seconds(offset))
            .await
            .unwrap();
        ids.push(record.id);
    }

    let records = store
        .range(&pair, base, base + Duration::seconds(2))
        .await
        .unwrap();
    let got: Vec<i64> = records.iter().map(|r| r.id).collect();
    ids.reverse();
    assert_eq!(got, ids);

    let inner = store
        .range(
            &pair,
            base + Duration::milliseconds(500),
            base + Duration::milliseconds(1500),
        )
        .await
        .unwrap();
    assert_eq!(inner.len(), 1);
}

#[tokio::test]
async fn test_range_with_inverted_bounds_is_empty() {
    let Some(store) = setup_store().await else {
        return;
    };
    let now = Utc::now();

    let records = store
        .range(&unique_pair(), now, now - Duration::hours(1))
        .await
        .unwrap();
    assert!(records.is_empty());
}
