use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Discrete sentiment class attached to a headline by the scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish" => Ok(SentimentLabel::Bullish),
            "bearish" => Ok(SentimentLabel::Bearish),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(format!("unknown sentiment label: {}", other)),
        }
    }
}

/// A deduplicated news headline for one ticker, unique on (ticker, headline, published_at).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct NewsEvent {
    pub id: Uuid,
    pub source: String,
    pub ticker: String,
    pub headline: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub sentiment_label: Option<String>,
    pub sentiment_score: Option<f64>,
    pub sentiment_updated_at: Option<DateTime<Utc>>,
    pub ingested_at: DateTime<Utc>,
}

/// Collector output; sentiment fields start out empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNewsEvent {
    pub source: String,
    pub ticker: String,
    pub headline: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl NewsEvent {
    pub fn from_create(event: &CreateNewsEvent, ingested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: event.source.clone(),
            ticker: event.ticker.clone(),
            headline: event.headline.clone(),
            url: event.url.clone(),
            published_at: event.published_at,
            sentiment_label: None,
            sentiment_score: None,
            sentiment_updated_at: None,
            ingested_at,
        }
    }
}

/// Position in the unscored queue: the `(published_at, id)` of the last event seen.
/// Ordering matches the queue order, publication time first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NewsCursor {
    pub published_at: DateTime<Utc>,
    pub id: Uuid,
}

impl NewsCursor {
    pub fn of(event: &NewsEvent) -> Self {
        Self {
            published_at: event.published_at,
            id: event.id,
        }
    }
}

/// Output of the sentiment scorer for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trips_through_str() {
        for label in [SentimentLabel::Bullish, SentimentLabel::Bearish, SentimentLabel::Neutral] {
            assert_eq!(label.as_str().parse::<SentimentLabel>(), Ok(label));
        }
        assert!("positive".parse::<SentimentLabel>().is_err());
    }
}
