//! Upstream clients for the Forecast Terminal
//!
//! This crate provides clients for:
//! - Prices: spot price feed (Coinbase-shaped)
//! - News: crypto news feed (CryptoNews-shaped)
//! - Forecast feed: remote per-asset forecasts (optional)
//! - Completion: natural-language replies via the OpenAI chat API
//!
//! Every client owns its own timeout and never retries.

pub mod completion;
pub mod error;
pub mod forecast_feed;
pub mod news;
pub mod prices;
pub mod request;

pub use completion::CompletionClient;
pub use error::UpstreamError;
pub use forecast_feed::ForecastFeedClient;
pub use news::NewsClient;
pub use prices::PricesClient;
pub use request::{Credential, UpstreamRequest};

use async_trait::async_trait;
use forecast_core::NewsQuery;
use serde_json::Value;

/// Source of the current price payload
///
/// `Ok(None)` means the upstream answered but had nothing usable (non-2xx).
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_prices(&self) -> Result<Option<Value>, UpstreamError>;
}

/// Source of the news payload
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<Option<Value>, UpstreamError>;
}

/// Text generation capability
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;
}
