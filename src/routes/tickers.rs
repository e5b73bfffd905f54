use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::TimeSeriesResponse;
use crate::services::timeseries_service::{self, DEFAULT_DAYS_BACK};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/tickers", get(list_tickers))
        .route("/ticker/:ticker/timeseries", get(get_ticker_timeseries))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TickerList {
    pub tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub days: Option<i64>,
}

async fn landing() -> Json<Value> {
    Json(json!({
        "message": "Financial News Sentiment Tracker API",
        "description": "Daily price, news sentiment and rolling correlation metrics per ticker.",
        "endpoints": {
            "/health": "Health check endpoint",
            "/tickers": "List supported tickers",
            "/ticker/{ticker}/timeseries?days=7": "Get sentiment + price timeseries (days 1-90)",
        },
    }))
}

async fn list_tickers(State(state): State<AppState>) -> Json<TickerList> {
    Json(TickerList {
        tickers: state.config.tickers.clone(),
    })
}

/// GET /ticker/:ticker/timeseries?days=N
async fn get_ticker_timeseries(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<TimeSeriesResponse>, AppError> {
    let ticker = ticker.trim().to_uppercase();
    let days = query.days.unwrap_or(DEFAULT_DAYS_BACK);
    info!("GET /ticker/{}/timeseries?days={}", ticker, days);

    if !state.config.is_supported(&ticker) {
        return Err(AppError::UnsupportedTicker(ticker));
    }

    let response = timeseries_service::build_ticker_timeseries(state.store.as_ref(), &ticker, days).await?;
    Ok(Json(response))
}
