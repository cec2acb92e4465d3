//! Quote table schema.
//!
//! Applied idempotently on every startup.

use sqlx::PgPool;

/// Create the `quotes` table and its indexes if they do not exist.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if any statement fails.
pub async fn initialize_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS quotes (
            id           BIGSERIAL PRIMARY KEY,
            trading_pair VARCHAR(20)    NOT NULL,
            ask_price    NUMERIC(20, 8) NOT NULL,
            bid_price    NUMERIC(20, 8) NOT NULL,
            timestamp    TIMESTAMPTZ    NOT NULL,
            created_at   TIMESTAMPTZ    NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_quotes_pair_created ON quotes (trading_pair, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quotes_created ON quotes (created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
