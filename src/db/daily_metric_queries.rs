use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::models::{DailyMetric, UpsertDailyMetric};

const METRIC_COLUMNS: &str = "ticker, date, close_price, daily_return, avg_sentiment_score, \
     dominant_sentiment_label, article_count, rolling_corr_7d, updated_at, corr_updated_at";

pub async fn ensure_unique_index(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS uniq_ticker_date \
         ON daily_ticker_metrics (ticker, date)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the metric fields of the (ticker, date) row, creating it if needed.
///
/// `rolling_corr_7d` and `corr_updated_at` are never touched. When every
/// metric field already holds the incoming value the row is left alone, so
/// `updated_at` only moves when the data actually changed.
pub async fn upsert(
    pool: &PgPool,
    m: &UpsertDailyMetric,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO daily_ticker_metrics (
            ticker, date, close_price, daily_return, avg_sentiment_score,
            dominant_sentiment_label, article_count, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (ticker, date) DO UPDATE SET
            close_price = EXCLUDED.close_price,
            daily_return = EXCLUDED.daily_return,
            avg_sentiment_score = EXCLUDED.avg_sentiment_score,
            dominant_sentiment_label = EXCLUDED.dominant_sentiment_label,
            article_count = EXCLUDED.article_count,
            updated_at = EXCLUDED.updated_at
        WHERE (
            daily_ticker_metrics.close_price,
            daily_ticker_metrics.daily_return,
            daily_ticker_metrics.avg_sentiment_score,
            daily_ticker_metrics.dominant_sentiment_label,
            daily_ticker_metrics.article_count
        ) IS DISTINCT FROM (
            EXCLUDED.close_price,
            EXCLUDED.daily_return,
            EXCLUDED.avg_sentiment_score,
            EXCLUDED.dominant_sentiment_label,
            EXCLUDED.article_count
        )
        "#,
    )
    .bind(&m.ticker)
    .bind(m.date)
    .bind(m.close_price)
    .bind(m.daily_return)
    .bind(m.avg_sentiment_score)
    .bind(&m.dominant_sentiment_label)
    .bind(m.article_count)
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All rows for a ticker, oldest date first.
pub async fn fetch_all(
    pool: &PgPool,
    ticker: &str,
) -> Result<Vec<DailyMetric>, sqlx::Error> {
    let sql = format!(
        "SELECT {METRIC_COLUMNS} FROM daily_ticker_metrics \
         WHERE ticker = $1 \
         ORDER BY date ASC"
    );

    sqlx::query_as::<_, DailyMetric>(&sql)
        .bind(ticker)
        .fetch_all(pool)
        .await
}

/// Rows for a ticker with `date >= start`, oldest first.
pub async fn fetch_since(
    pool: &PgPool,
    ticker: &str,
    start: NaiveDate,
) -> Result<Vec<DailyMetric>, sqlx::Error> {
    let sql = format!(
        "SELECT {METRIC_COLUMNS} FROM daily_ticker_metrics \
         WHERE ticker = $1 AND date >= $2 \
         ORDER BY date ASC"
    );

    sqlx::query_as::<_, DailyMetric>(&sql)
        .bind(ticker)
        .bind(start)
        .fetch_all(pool)
        .await
}

pub async fn fetch_latest_date(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM daily_ticker_metrics \
         WHERE ticker = $1 \
         ORDER BY date DESC \
         LIMIT 1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

/// Attach a correlation value to an existing row. Rows that already carry
/// the same value keep their original `corr_updated_at`.
pub async fn update_rolling_corr(
    pool: &PgPool,
    ticker: &str,
    date: NaiveDate,
    corr: Option<f64>,
    computed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE daily_ticker_metrics
        SET rolling_corr_7d = $3,
            corr_updated_at = $4
        WHERE ticker = $1
          AND date = $2
          AND (corr_updated_at IS NULL OR rolling_corr_7d IS DISTINCT FROM $3)
        "#,
    )
    .bind(ticker)
    .bind(date)
    .bind(corr)
    .bind(computed_at)
    .execute(pool)
    .await?;

    Ok(())
}
