//! `PostgreSQL` quote store.
//!
//! Prices are stored as `NUMERIC(20, 8)` and timestamps as `TIMESTAMPTZ`
//! (microsecond precision). `save` normalises the quote to that precision
//! before writing so the returned record matches what a later read yields.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::schema::initialize_schema;
use crate::application::ports::{QuoteStoreError, QuoteStorePort};
use crate::domain::quote::{Quote, QuoteRecord, TradingPair};
use crate::infrastructure::metrics;

/// Liveness probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool acquire timeout.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Decimal places kept by the `NUMERIC(20, 8)` price columns.
const PRICE_SCALE: u32 = 8;

/// Quote store backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PostgresQuoteStore {
    pool: PgPool,
}

impl PostgresQuoteStore {
    /// Connect, verify connectivity and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns `QuoteStoreError::Unavailable` if the database cannot be
    /// reached or the schema cannot be applied.
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
    ) -> Result<Self, QuoteStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        initialize_schema(&pool).await.map_err(unavailable)?;

        info!(
            max_connections = max_connections,
            "PostgreSQL connection pool initialized"
        );

        Ok(Self { pool })
    }

    /// Create a store with an existing pool (for testing).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow) -> Result<QuoteRecord, QuoteStoreError> {
        let field = |name: &str, e: sqlx::Error| QuoteStoreError::Query {
            message: format!("{name}: {e}"),
        };

        let id = row.try_get::<i64, _>("id").map_err(|e| field("id", e))?;
        let pair = row
            .try_get::<String, _>("trading_pair")
            .map_err(|e| field("trading_pair", e))?;
        let ask = row
            .try_get::<Decimal, _>("ask_price")
            .map_err(|e| field("ask_price", e))?;
        let bid = row
            .try_get::<Decimal, _>("bid_price")
            .map_err(|e| field("bid_price", e))?;
        let observed_at = row
            .try_get::<DateTime<Utc>, _>("timestamp")
            .map_err(|e| field("timestamp", e))?;
        let persisted_at = row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| field("created_at", e))?;

        let pair: TradingPair = pair.parse().map_err(|e| QuoteStoreError::Query {
            message: format!("row {id}: {e}"),
        })?;
        let quote = Quote::new(pair, ask, bid, observed_at).map_err(|e| QuoteStoreError::Query {
            message: format!("row {id}: {e}"),
        })?;

        Ok(QuoteRecord {
            id,
            quote,
            persisted_at,
        })
    }

    async fn insert(
        &self,
        quote: &Quote,
        persisted_at: DateTime<Utc>,
    ) -> Result<QuoteRecord, QuoteStoreError> {
        let quote = Quote::new(
            quote.trading_pair().clone(),
            quote.ask_price().round_dp(PRICE_SCALE),
            quote.bid_price().round_dp(PRICE_SCALE),
            quote.observed_at().trunc_subsecs(6),
        )
        .map_err(|e| QuoteStoreError::Persistence {
            message: e.to_string(),
        })?;
        let persisted_at = persisted_at.trunc_subsecs(6);

        let row = sqlx::query(
            r"
            INSERT INTO quotes (trading_pair, ask_price, bid_price, timestamp, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(quote.trading_pair().to_string())
        .bind(quote.ask_price())
        .bind(quote.bid_price())
        .bind(quote.observed_at())
        .bind(persisted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| QuoteStoreError::Persistence {
            message: e.to_string(),
        })?;

        let id = row
            .try_get::<i64, _>("id")
            .map_err(|e| QuoteStoreError::Persistence {
                message: format!("id: {e}"),
            })?;

        Ok(QuoteRecord {
            id,
            quote,
            persisted_at,
        })
    }
}

fn unavailable(e: sqlx::Error) -> QuoteStoreError {
    QuoteStoreError::Unavailable {
        message: e.to_string(),
    }
}

fn query_error(e: sqlx::Error) -> QuoteStoreError {
    QuoteStoreError::Query {
        message: e.to_string(),
    }
}

#[async_trait]
impl QuoteStorePort for PostgresQuoteStore {
    async fn save(
        &self,
        quote: &Quote,
        persisted_at: DateTime<Utc>,
    ) -> Result<QuoteRecord, QuoteStoreError> {
        let result = self.insert(quote, persisted_at).await;
        metrics::record_store_write(result.is_ok());

        let record = result?;
        debug!(
            id = record.id,
            pair = %record.quote.trading_pair(),
            "Quote saved to database"
        );
        Ok(record)
    }

    async fn latest(&self, pair: &TradingPair) -> Result<QuoteRecord, QuoteStoreError> {
        let row = sqlx::query(
            r"
            SELECT id, trading_pair, ask_price, bid_price, timestamp, created_at
            FROM quotes
            WHERE trading_pair = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(pair.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => Self::row_to_record(&row),
            None => Err(QuoteStoreError::NotFound {
                pair: pair.to_string(),
            }),
        }
    }

    async fn range(
        &self,
        pair: &TradingPair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<QuoteRecord>, QuoteStoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r"
            SELECT id, trading_pair, ask_price, bid_price, timestamp, created_at
            FROM quotes
            WHERE trading_pair = $1 AND created_at BETWEEN $2 AND $3
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(pair.to_string())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn probe_alive(&self) -> Result<(), QuoteStoreError> {
        match tokio::time::timeout(PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool))
            .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(unavailable(e)),
            Err(_) => Err(QuoteStoreError::Unavailable {
                message: format!("ping timed out after {}s", PROBE_TIMEOUT.as_secs()),
            }),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}
