//! Spot price feed client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::UpstreamError;
use crate::request::{fetch_optional_json, http_client, normalize_base_url, UpstreamRequest};
use crate::PriceFeed;

/// Default spot price API
pub const DEFAULT_PRICES_BASE_URL: &str = "https://api.coinbase.com";

/// Currency every quote is requested in
const QUOTE_CURRENCY: &str = "USD";

/// Spot price client
pub struct PricesClient {
    client: Client,
    base_url: String,
}

impl PricesClient {
    /// Create a new prices client against the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Fetch the upstream-shaped spot price payload
    #[instrument(skip(self), fields(currency = QUOTE_CURRENCY))]
    pub async fn fetch(&self) -> Result<Option<Value>, UpstreamError> {
        let request = UpstreamRequest::get(format!("{}/v2/prices/spot", self.base_url))
            .query("currency", QUOTE_CURRENCY);

        let payload = fetch_optional_json(&self.client, request, "prices").await?;
        info!(present = payload.is_some(), "Fetched spot prices");
        Ok(payload)
    }
}

#[async_trait]
impl PriceFeed for PricesClient {
    async fn fetch_prices(&self) -> Result<Option<Value>, UpstreamError> {
        self.fetch().await
    }
}
