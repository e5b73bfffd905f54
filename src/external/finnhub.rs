use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::external::news_provider::{ExternalNewsItem, NewsProvider, NewsProviderError};

const COMPANY_NEWS_URL: &str = "https://finnhub.io/api/v1/company-news";

pub struct FinnhubProvider {
    client: reqwest::Client,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    headline: Option<String>,
    datetime: i64,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

fn items_from_articles(articles: Vec<FinnhubArticle>) -> Vec<ExternalNewsItem> {
    articles
        .into_iter()
        .filter_map(|article| {
            let headline = article.headline?.trim().to_string();
            if headline.is_empty() {
                return None;
            }
            let published_at = DateTime::from_timestamp(article.datetime, 0)?;
            Some(ExternalNewsItem {
                source: article
                    .source
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "unknown".to_string()),
                headline,
                url: article.url.filter(|u| !u.is_empty()),
                published_at,
            })
        })
        .collect()
}

#[async_trait]
impl NewsProvider for FinnhubProvider {
    async fn fetch_company_news(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExternalNewsItem>, NewsProviderError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get(COMPANY_NEWS_URL)
            .query(&[
                ("symbol", ticker),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| NewsProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(NewsProviderError::RateLimited),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(NewsProviderError::Unauthorized)
            }
            status if !status.is_success() => {
                return Err(NewsProviderError::BadResponse(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let articles = resp
            .json::<Vec<FinnhubArticle>>()
            .await
            .map_err(|e| NewsProviderError::Parse(e.to_string()))?;

        Ok(items_from_articles(articles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_articles_without_headline_are_dropped() {
        let articles: Vec<FinnhubArticle> = serde_json::from_str(
            r#"[
                {"category":"company","datetime":1717430400,"headline":"Nvidia unveils new AI chips","id":1,
                 "source":"Reuters","summary":"","url":"https://example.com/a"},
                {"category":"company","datetime":1717434000,"headline":"","id":2,"source":"Yahoo","url":""},
                {"category":"company","datetime":1717437600,"headline":"Nvidia tops $3 trillion","id":3,
                 "source":"","url":""}
            ]"#,
        )
        .unwrap();

        let items = items_from_articles(articles);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(items[0].published_at.timestamp(), 1717430400);
        assert_eq!(items[1].source, "unknown");
        assert_eq!(items[1].url, None);
    }
}
