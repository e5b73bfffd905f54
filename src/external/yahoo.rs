use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::external::price_provider::{ExternalCandle, PriceProvider, PriceProviderError};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) sentiment-tracker/0.1";

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn range_for_days(days: u32) -> &'static str {
    if days <= 30 {
        "1mo"
    } else if days <= 90 {
        "3mo"
    } else if days <= 180 {
        "6mo"
    } else {
        "1y"
    }
}

fn candles_from_chart(body: YahooChartResponse) -> Result<Vec<ExternalCandle>, PriceProviderError> {
    if body.chart.error.as_ref().is_some_and(|e| !e.is_null()) {
        return Err(PriceProviderError::NotFound);
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?;

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut out = Vec::with_capacity(result.timestamp.len());

    // Quote arrays line up with the timestamp list by index.
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };

        let ts = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?;

        out.push(ExternalCandle {
            ts,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0),
        });
    }

    out.sort_by_key(|c| c.ts);
    Ok(out)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn source(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_candles(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalCandle>, PriceProviderError> {
        let url = format!(
            "{CHART_URL}/{ticker}?range={range}&interval=1d",
            range = range_for_days(days)
        );

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(PriceProviderError::NotFound),
            status if !status.is_success() => {
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        candles_from_chart(body)
    }
}
