//! Server configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use forecast_model::StaticFeatures;
use forecast_services::{EnrichmentPolicy, DEFAULT_PREDICTION_TTL};
use forecast_upstream::completion::{DEFAULT_OPENAI_API_BASE, DEFAULT_OPENAI_MODEL};
use forecast_upstream::news::DEFAULT_NEWS_BASE_URL;
use forecast_upstream::prices::DEFAULT_PRICES_BASE_URL;

const DEFAULT_PORT: u16 = 5002;
const DEFAULT_ARCHITECTURE_PATH: &str = "model/forecast_model.json";
const DEFAULT_WEIGHTS_PATH: &str = "model/forecast_model.weights.bin";
const DEFAULT_ASSET: &str = "BTC";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub model_architecture_path: PathBuf,
    pub model_weights_path: PathBuf,
    /// Fixed model input row; zeros of the model's width when unset
    pub model_input: Option<StaticFeatures>,
    pub prediction_ttl: Duration,
    /// Symbol the local model's forecast is labelled with in chat
    pub prediction_asset: String,
    /// Chat is unavailable without a key
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,
    pub news_api_key: String,
    pub news_api_base: String,
    pub prices_api_base: String,
    /// Remote forecasts for chat; local predictions when unset
    pub forecast_feed_url: Option<String>,
    pub upstream_timeout: Duration,
    pub chat_enrichment: EnrichmentPolicy,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, treating empty values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_input = var("MODEL_INPUT")
            .map(|raw| {
                StaticFeatures::parse(&raw).map_err(|e| ConfigError::invalid("MODEL_INPUT", &raw, e))
            })
            .transpose()?;

        let chat_enrichment = match var("CHAT_ENRICHMENT") {
            Some(raw) => EnrichmentPolicy::from_str(&raw)
                .map_err(|e| ConfigError::invalid("CHAT_ENRICHMENT", &raw, e))?,
            None => EnrichmentPolicy::default(),
        };

        let ttl_secs: u64 = parse_or("PREDICTION_TTL_SECS", var("PREDICTION_TTL_SECS"), DEFAULT_PREDICTION_TTL.as_secs())?;
        if ttl_secs == 0 {
            return Err(ConfigError::invalid("PREDICTION_TTL_SECS", "0", "must be at least 1"));
        }

        let timeout_secs: u64 =
            parse_or("UPSTREAM_TIMEOUT_SECS", var("UPSTREAM_TIMEOUT_SECS"), DEFAULT_UPSTREAM_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        Ok(Self {
            port: parse_or("SERVER_PORT", var("SERVER_PORT"), DEFAULT_PORT)?,
            model_architecture_path: var("MODEL_ARCHITECTURE_PATH")
                .unwrap_or_else(|| DEFAULT_ARCHITECTURE_PATH.to_string())
                .into(),
            model_weights_path: var("MODEL_WEIGHTS_PATH")
                .unwrap_or_else(|| DEFAULT_WEIGHTS_PATH.to_string())
                .into(),
            model_input,
            prediction_ttl: Duration::from_secs(ttl_secs),
            prediction_asset: var("PREDICTION_ASSET").unwrap_or_else(|| DEFAULT_ASSET.to_string()),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_api_base: var("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            news_api_key: var("CRYPTO_NEWS_API_KEY").unwrap_or_default(),
            news_api_base: var("NEWS_API_BASE").unwrap_or_else(|| DEFAULT_NEWS_BASE_URL.to_string()),
            prices_api_base: var("PRICES_API_BASE").unwrap_or_else(|| DEFAULT_PRICES_BASE_URL.to_string()),
            forecast_feed_url: var("FORECAST_FEED_URL"),
            upstream_timeout: Duration::from_secs(timeout_secs),
            chat_enrichment,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(key, &raw, e)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key} ('{value}'): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl std::fmt::Display) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
