//! News query parameters

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Tickers requested when the caller does not name any
pub const DEFAULT_NEWS_TICKERS: &str = "BTC,ETH,LTC,XRP,ADA,DOT,BNB,LINK";

/// Articles requested when the caller does not give a count
pub const DEFAULT_NEWS_ITEMS: u32 = 10;

/// Parameters for a crypto news lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsQuery {
    /// Comma-separated ticker list
    #[serde(default = "default_tickers")]
    pub tickers: String,
    /// Maximum number of articles
    #[serde(default = "default_items")]
    pub items: u32,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            items: default_items(),
        }
    }
}

impl NewsQuery {
    pub fn new(tickers: Option<String>, items: Option<u32>) -> Self {
        let tickers = tickers
            .map(|t| normalize_tickers(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(default_tickers);

        Self {
            tickers,
            items: items.unwrap_or(DEFAULT_NEWS_ITEMS),
        }
    }
}

/// Trim whitespace around each ticker and drop empty entries
fn normalize_tickers(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .join(",")
}

fn default_tickers() -> String {
    DEFAULT_NEWS_TICKERS.to_string()
}

fn default_items() -> u32 {
    DEFAULT_NEWS_ITEMS
}
