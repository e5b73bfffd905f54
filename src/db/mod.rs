pub mod daily_metric_queries;
pub mod news_queries;
pub mod price_queries;
