mod news_event;
mod price_candle;
mod daily_metric;
mod timeseries;

pub use news_event::{NewsEvent, NewsCursor, CreateNewsEvent, SentimentLabel, SentimentScore};
pub use price_candle::PriceCandle;
pub use daily_metric::{DailyMetric, UpsertDailyMetric};
pub use timeseries::{TimeSeriesPoint, TimeSeriesResponse};
