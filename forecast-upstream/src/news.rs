//! Crypto news feed client

use std::time::Duration;

use async_trait::async_trait;
use forecast_core::NewsQuery;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::UpstreamError;
use crate::request::{fetch_optional_json, http_client, normalize_base_url, Credential, UpstreamRequest};
use crate::NewsFeed;

/// Default news API
pub const DEFAULT_NEWS_BASE_URL: &str = "https://cryptonews-api.com";

/// Crypto news client
///
/// Articles come back under `data`, each carrying at least `title` and `url`.
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    /// Create a new news client
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: normalize_base_url(base_url)?,
            api_key,
        })
    }

    /// Fetch the upstream-shaped news payload
    #[instrument(skip(self), fields(tickers = %query.tickers, items = query.items))]
    pub async fn fetch(&self, query: &NewsQuery) -> Result<Option<Value>, UpstreamError> {
        let request = UpstreamRequest::get(format!("{}/api/v1", self.base_url))
            .query("tickers", query.tickers.clone())
            .query("items", query.items.to_string())
            .credential(Credential {
                name: "token",
                value: self.api_key.clone(),
            });

        let payload: Option<Value> = fetch_optional_json(&self.client, request, "news").await?;

        let articles = payload
            .as_ref()
            .and_then(|p| p.get("data"))
            .and_then(Value::as_array)
            .map(Vec::len);
        info!(?articles, "Fetched crypto news");

        Ok(payload)
    }
}

#[async_trait]
impl NewsFeed for NewsClient {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<Option<Value>, UpstreamError> {
        self.fetch(query).await
    }
}
