//! Forecast Terminal API Server
//!
//! Serves model predictions through a TTL cache and a chat endpoint enriched
//! with forecasts, prices and news.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use forecast_api::{app, AppConfig, AppState};
use forecast_model::{DenseModel, FeatureSource, Predictor, StaticFeatures};
use forecast_services::{ChatAggregator, ForecastSource, LocalForecasts, MemoryCache, PredictionService};
use forecast_upstream::{CompletionClient, ForecastFeedClient, NewsClient, PricesClient};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How often expired cache entries are swept
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,forecast_api=debug")),
        )
        .init();

    info!("Starting Forecast Terminal API");

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // A missing or broken model is fatal
    let model = DenseModel::load(&config.model_architecture_path, &config.model_weights_path)
        .context("Failed to load forecast model")?;
    let features: Arc<dyn FeatureSource> = match config.model_input.clone() {
        Some(features) => {
            info!("Using configured model input ({} features)", features.width());
            Arc::new(features)
        }
        None => {
            warn!("MODEL_INPUT not set, predicting from an all-zero input row");
            Arc::new(StaticFeatures::zeros(model.input_dim()))
        }
    };

    // Cache with a background sweep of expired entries
    let cache = Arc::new(MemoryCache::new());
    Arc::clone(&cache).spawn_sweeper(CACHE_SWEEP_INTERVAL);

    let predictions = PredictionService::new(
        cache.clone(),
        Arc::new(model),
        features,
        config.prediction_ttl,
    );

    // Upstream clients
    let prices = Arc::new(PricesClient::new(&config.prices_api_base, config.upstream_timeout)?);
    let news = Arc::new(NewsClient::new(
        &config.news_api_base,
        config.news_api_key.clone(),
        config.upstream_timeout,
    )?);
    if config.news_api_key.is_empty() {
        warn!("CRYPTO_NEWS_API_KEY not set - news requests will likely be rejected upstream");
    }

    let forecasts: Arc<dyn ForecastSource> = match &config.forecast_feed_url {
        Some(url) => {
            info!("Chat forecasts from remote feed at {}", url);
            Arc::new(ForecastFeedClient::new(url, config.upstream_timeout)?)
        }
        None => {
            info!("Chat forecasts from local model, labelled {}", config.prediction_asset);
            Arc::new(LocalForecasts::new(predictions.clone(), config.prediction_asset.clone()))
        }
    };

    // Chat service (optional - requires OPENAI_API_KEY)
    let chat = match &config.openai_api_key {
        Some(key) => {
            let completion = CompletionClient::new(key, &config.openai_api_base, config.upstream_timeout)?
                .with_model(&config.openai_model);
            info!(
                "Chat enabled (model {}, enrichment {:?})",
                config.openai_model, config.chat_enrichment
            );
            Some(Arc::new(
                ChatAggregator::new(Arc::new(completion), forecasts, prices.clone(), news.clone())
                    .with_policy(config.chat_enrichment),
            ))
        }
        None => {
            info!("Chat not available. Set OPENAI_API_KEY to enable.");
            None
        }
    };

    let state = AppState {
        predictions,
        chat,
        prices,
        news,
        cache,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
