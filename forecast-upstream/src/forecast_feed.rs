//! Remote forecast feed client
//!
//! Some deployments publish forecasts for several assets from a separate
//! service. The feed answers with `{asset: {next_hour, next_day, next_week}}`.

use std::time::Duration;

use forecast_core::ForecastMap;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use crate::error::UpstreamError;
use crate::request::{fetch_optional_json, http_client, UpstreamRequest};

pub struct ForecastFeedClient {
    client: Client,
    url: String,
}

impl ForecastFeedClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        Url::parse(url)
            .map_err(|e| UpstreamError::InvalidConfig(format!("invalid forecast feed URL '{}': {}", url, e)))?;

        Ok(Self {
            client: http_client(timeout)?,
            url: url.to_string(),
        })
    }

    /// Fetch per-asset forecasts, preserving the feed's ordering
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Option<ForecastMap>, UpstreamError> {
        let forecasts: Option<ForecastMap> =
            fetch_optional_json(&self.client, UpstreamRequest::get(&self.url), "forecast-feed").await?;

        info!(
            assets = forecasts.as_ref().map(|f| f.len()).unwrap_or(0),
            "Fetched remote forecasts"
        );
        Ok(forecasts)
    }
}
