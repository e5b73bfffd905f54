pub mod finnhub;
pub mod news_provider;
pub mod price_provider;
pub mod yahoo;
