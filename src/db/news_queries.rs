use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateNewsEvent, NewsCursor, NewsEvent};

const NEWS_COLUMNS: &str = "id, source, ticker, headline, url, published_at, \
     sentiment_label, sentiment_score, sentiment_updated_at, ingested_at";

/// Insert headlines that are not already stored. A re-fetched headline never
/// overwrites an existing (possibly scored) row.
pub async fn insert_missing(
    pool: &PgPool,
    events: &[CreateNewsEvent],
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for e in events {
        let result = sqlx::query(
            r#"
            INSERT INTO news_events (id, source, ticker, headline, url, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ticker, headline, published_at) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&e.source)
        .bind(&e.ticker)
        .bind(&e.headline)
        .bind(&e.url)
        .bind(e.published_at)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected() as usize;
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Oldest unscored headlines first, keyset-paged on `(published_at, id)`.
pub async fn fetch_unscored(
    pool: &PgPool,
    after: Option<NewsCursor>,
    limit: i64,
) -> Result<Vec<NewsEvent>, sqlx::Error> {
    let sql = format!(
        "SELECT {NEWS_COLUMNS} FROM news_events \
         WHERE sentiment_score IS NULL \
           AND ($1::timestamptz IS NULL OR (published_at, id) > ($1::timestamptz, $2::uuid)) \
         ORDER BY published_at ASC, id ASC \
         LIMIT $3"
    );

    sqlx::query_as::<_, NewsEvent>(&sql)
        .bind(after.map(|c| c.published_at))
        .bind(after.map(|c| c.id))
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn update_sentiment(
    pool: &PgPool,
    id: Uuid,
    label: &str,
    score: f64,
    scored_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE news_events
        SET sentiment_label = $2,
            sentiment_score = $3,
            sentiment_updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(label)
    .bind(score)
    .bind(scored_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Scored headlines for a ticker with `start <= published_at < end`.
///
/// Ordered by publication time, then headline bytes (`COLLATE "C"`), so callers
/// that depend on encounter order see the same sequence whatever the database locale.
pub async fn fetch_scored_between(
    pool: &PgPool,
    ticker: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<NewsEvent>, sqlx::Error> {
    let sql = format!(
        "SELECT {NEWS_COLUMNS} FROM news_events \
         WHERE ticker = $1 \
           AND published_at >= $2 \
           AND published_at < $3 \
           AND sentiment_score IS NOT NULL \
         ORDER BY published_at ASC, headline COLLATE \"C\" ASC"
    );

    sqlx::query_as::<_, NewsEvent>(&sql)
        .bind(ticker)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
}
