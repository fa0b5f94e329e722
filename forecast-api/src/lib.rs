//! Forecast Terminal API
//!
//! Router, shared state and configuration for the HTTP server. The binary in
//! `main.rs` wires real clients into [`AppState`]; tests wire fakes.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    Router,
};
use forecast_services::{ChatAggregator, MemoryCache, PredictionService};
use forecast_upstream::{NewsFeed, PriceFeed};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub predictions: PredictionService,
    /// Chat service (optional - requires OPENAI_API_KEY)
    pub chat: Option<Arc<ChatAggregator>>,
    pub prices: Arc<dyn PriceFeed>,
    pub news: Arc<dyn NewsFeed>,
    pub cache: Arc<MemoryCache>,
}

/// Build the full router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
