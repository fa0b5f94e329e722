//! Chat Aggregator
//!
//! Produces a generated reply for a chat message. Messages asking for an
//! investment recommendation are enriched with the latest forecasts, prices
//! and news, fetched concurrently and rendered as a plain-text summary.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use forecast_core::{ForecastError, ForecastMap, ForecastResult, NewsQuery};
use forecast_upstream::{Completion, ForecastFeedClient, NewsFeed, PriceFeed};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::prediction_service::PredictionService;

/// Words that turn on enrichment, matched case-insensitively
const TRIGGER_WORDS: [&str; 2] = ["investment", "recommendation"];

/// Prompt returned when a chat request carries no message
pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a message.";

/// What to do when one of the enrichment fetches fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentPolicy {
    /// Leave the failed fragment out of the summary
    #[default]
    Degrade,
    /// Fail the whole chat request
    FailFast,
}

impl std::str::FromStr for EnrichmentPolicy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(EnrichmentPolicy::Degrade),
            "fail-fast" | "fail_fast" | "failfast" => Ok(EnrichmentPolicy::FailFast),
            other => Err(ForecastError::config(format!(
                "unknown chat enrichment policy '{}', expected 'degrade' or 'fail-fast'",
                other
            ))),
        }
    }
}

/// Source of per-asset forecasts for the summary
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn forecasts(&self) -> ForecastResult<Option<ForecastMap>>;
}

/// Forecasts from the local model, labelled with one asset symbol
pub struct LocalForecasts {
    service: PredictionService,
    asset: String,
}

impl LocalForecasts {
    pub fn new(service: PredictionService, asset: impl Into<String>) -> Self {
        Self {
            service,
            asset: asset.into(),
        }
    }
}

#[async_trait]
impl ForecastSource for LocalForecasts {
    async fn forecasts(&self) -> ForecastResult<Option<ForecastMap>> {
        let triple = self.service.get_triple().await?;
        let mut map = ForecastMap::new();
        map.insert(self.asset.clone(), triple);
        Ok(Some(map))
    }
}

#[async_trait]
impl ForecastSource for ForecastFeedClient {
    async fn forecasts(&self) -> ForecastResult<Option<ForecastMap>> {
        Ok(self.fetch().await?)
    }
}

/// Combines the completion reply with upstream fragments
pub struct ChatAggregator {
    completion: Arc<dyn Completion>,
    forecasts: Arc<dyn ForecastSource>,
    prices: Arc<dyn PriceFeed>,
    news: Arc<dyn NewsFeed>,
    policy: EnrichmentPolicy,
}

/// Fragments gathered for one enriched reply; `None` means absent
#[derive(Debug, Default)]
struct Fragments {
    forecasts: Option<ForecastMap>,
    prices: Option<Value>,
    news: Option<Value>,
}

impl ChatAggregator {
    pub fn new(
        completion: Arc<dyn Completion>,
        forecasts: Arc<dyn ForecastSource>,
        prices: Arc<dyn PriceFeed>,
        news: Arc<dyn NewsFeed>,
    ) -> Self {
        Self {
            completion,
            forecasts,
            prices,
            news,
            policy: EnrichmentPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generate a reply to `message`, enriched when it asks for a recommendation
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn reply(&self, message: &str) -> ForecastResult<String> {
        if message.trim().is_empty() {
            return Err(ForecastError::validation(EMPTY_MESSAGE_REPLY));
        }

        let mut reply = self
            .completion
            .complete(message)
            .await
            .map_err(|e| ForecastError::upstream("completion", e.to_string()))?;

        if wants_enrichment(message) {
            let fragments = self.gather().await?;
            if let Some(summary) = render_summary(&fragments) {
                reply.push_str(&summary);
            }
        }

        Ok(reply)
    }

    /// Fetch all three fragments concurrently, applying the failure policy
    async fn gather(&self) -> ForecastResult<Fragments> {
        let query = NewsQuery::default();
        let (forecasts, prices, news) = tokio::join!(
            self.forecasts.forecasts(),
            self.prices.fetch_prices(),
            self.news.fetch_news(&query),
        );

        let forecasts = self.settle("predictions", forecasts)?;
        let prices = self.settle("prices", prices.map_err(ForecastError::from))?;
        let news = self.settle("news", news.map_err(ForecastError::from))?;

        info!(
            forecasts = forecasts.is_some(),
            prices = prices.is_some(),
            news = news.is_some(),
            "Gathered enrichment fragments"
        );

        Ok(Fragments {
            forecasts,
            prices,
            news,
        })
    }

    fn settle<T>(&self, fragment: &str, result: ForecastResult<Option<T>>) -> ForecastResult<Option<T>> {
        match (result, self.policy) {
            (Ok(Some(value)), _) => Ok(Some(value)),
            (Ok(None), EnrichmentPolicy::Degrade) => {
                warn!(fragment, "Enrichment fragment absent, omitting");
                Ok(None)
            }
            (Err(e), EnrichmentPolicy::Degrade) => {
                warn!(fragment, "Enrichment fetch failed, omitting: {}", e);
                Ok(None)
            }
            (Ok(None), EnrichmentPolicy::FailFast) => {
                Err(ForecastError::upstream(fragment, "upstream returned no data"))
            }
            (Err(e), EnrichmentPolicy::FailFast) => Err(ForecastError::upstream(fragment, e.to_string())),
        }
    }
}

/// Whether the message asks for market context
pub fn wants_enrichment(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRIGGER_WORDS.iter().any(|word| lower.contains(word))
}

/// Render the summary block, or `None` when every fragment is absent
fn render_summary(fragments: &Fragments) -> Option<String> {
    // Articles without a title and url are left out rather than filled in
    let articles: Vec<(&str, &str)> = fragments
        .news
        .as_ref()
        .and_then(|n| n.get("data"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|article| {
            let title = article.get("title").and_then(Value::as_str)?;
            let url = article.get("url").and_then(Value::as_str)?;
            Some((title, url))
        })
        .collect();

    if fragments.forecasts.is_none() && articles.is_empty() {
        return None;
    }

    let mut out = String::from("\n\nBased on the latest data:\n");

    if let Some(forecasts) = &fragments.forecasts {
        for (asset, triple) in forecasts {
            let _ = writeln!(
                out,
                "{}: Predicted price next hour: ${:.2}, next day: ${:.2}, next week: ${:.2}",
                asset, triple.next_hour, triple.next_day, triple.next_week
            );

            if let Some(quote) = fragments.prices.as_ref().and_then(|p| price_quote(p, asset)) {
                match quote.change_24h {
                    Some(change) => {
                        let _ = writeln!(out, "Current price: ${}, 24h change: {:.2}%", quote.price, change);
                    }
                    None => {
                        let _ = writeln!(out, "Current price: ${}", quote.price);
                    }
                }
            }
        }
    }

    if !articles.is_empty() {
        out.push_str("\nLatest news:\n");
        for (title, url) in articles {
            let _ = writeln!(out, "- {}: {}", title, url);
        }
    }

    Some(out)
}

#[derive(Debug, PartialEq)]
struct PriceQuote {
    price: String,
    change_24h: Option<f64>,
}

/// Find an asset's price in either supported payload shape:
/// - keyed: `{"BTC": {"usd": 64000.5, "usd_24h_change": 1.2}}`
/// - spot list: `{"data": [{"base": "BTC", "amount": "64000.50"}]}`
fn price_quote(prices: &Value, asset: &str) -> Option<PriceQuote> {
    let keyed = prices
        .get(asset)
        .or_else(|| prices.get(asset.to_lowercase()))
        .and_then(|entry| entry.get("usd").map(|usd| (usd, entry)));

    if let Some((usd, entry)) = keyed {
        return Some(PriceQuote {
            price: display_number(usd)?,
            change_24h: entry.get("usd_24h_change").and_then(Value::as_f64),
        });
    }

    let is_asset = |item: &&Value| item.get("base").and_then(Value::as_str) == Some(asset);
    let data = prices.get("data")?;
    let spot = match data {
        Value::Array(items) => items.iter().find(is_asset),
        Value::Object(_) => Some(data).filter(is_asset),
        _ => None,
    }?;

    Some(PriceQuote {
        price: display_number(spot.get("amount")?)?,
        change_24h: None,
    })
}

fn display_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
