use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::errors::AppError;
use crate::models::NewsEvent;
use crate::store::Store;

/// Reduction of one ticker's scored headlines for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySentiment {
    pub avg_sentiment_score: Option<f64>,
    pub dominant_label: Option<String>,
    pub article_count: i32,
}

impl DailySentiment {
    pub fn empty() -> Self {
        Self {
            avg_sentiment_score: None,
            dominant_label: None,
            article_count: 0,
        }
    }
}

/// Half-open UTC bounds `[midnight(date), midnight(date + 1))`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Most frequent label. Ties go to the label encountered first, so the
/// result depends on the order of `labels`.
pub fn dominant_label<'a, I>(labels: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, n) in counts {
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((label, n));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Summarize a day's events in retrieval order. Unscored events are ignored
/// entirely; scored events without a label still count towards the average
/// and the article count.
pub fn summarize_day(events: &[NewsEvent]) -> DailySentiment {
    let scored: Vec<&NewsEvent> = events.iter().filter(|e| e.sentiment_score.is_some()).collect();
    if scored.is_empty() {
        return DailySentiment::empty();
    }

    let scores: Vec<f64> = scored.iter().filter_map(|e| e.sentiment_score).collect();
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;

    let labels = scored
        .iter()
        .filter_map(|e| e.sentiment_label.as_deref())
        .filter(|l| !l.is_empty());

    DailySentiment {
        avg_sentiment_score: Some(avg),
        dominant_label: dominant_label(labels),
        article_count: scored.len() as i32,
    }
}

pub async fn aggregate_sentiment_for_day(
    store: &dyn Store,
    ticker: &str,
    date: NaiveDate,
) -> Result<DailySentiment, AppError> {
    let (start, end) = day_bounds(date);
    let events = store.fetch_scored_news(ticker, start, end).await?;
    Ok(summarize_day(&events))
}
