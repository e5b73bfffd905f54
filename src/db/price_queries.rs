use sqlx::PgPool;
use tracing::error;

use crate::models::PriceCandle;

/// Insert candles that are not already stored. Existing (ticker, ts) rows are left as-is.
/// Returns the number of newly inserted candles.
pub async fn insert_missing(
    pool: &PgPool,
    candles: &[PriceCandle],
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for c in candles {
        let result = sqlx::query(
            r#"
            INSERT INTO price_candles (ticker, ts, open, high, low, close, volume, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (ticker, ts) DO NOTHING
            "#,
        )
        .bind(&c.ticker)
        .bind(c.ts)
        .bind(c.open)
        .bind(c.high)
        .bind(c.low)
        .bind(c.close)
        .bind(c.volume)
        .bind(&c.source)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert candle for {} at {}: {}", c.ticker, c.ts, e);
            e
        })?;

        inserted += result.rows_affected() as usize;
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All candles for a ticker, oldest first.
pub async fn fetch_all(
    pool: &PgPool,
    ticker: &str,
) -> Result<Vec<PriceCandle>, sqlx::Error> {
    sqlx::query_as::<_, PriceCandle>(
        r#"
        SELECT ticker, ts, open, high, low, close, volume, source
        FROM price_candles
        WHERE ticker = $1
        ORDER BY ts ASC
        "#,
    )
    .bind(ticker)
    .fetch_all(pool)
    .await
}
