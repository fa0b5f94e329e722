//! Business logic services for the Forecast Terminal
//!
//! This crate provides the service layer between the HTTP handlers and the
//! model and upstream clients: the TTL cache, single-flight coalescing, the
//! cache-aside prediction flow, and chat enrichment.

pub mod chat_aggregator;
pub mod prediction_service;
pub mod single_flight;
pub mod ttl_cache;

pub use chat_aggregator::{
    wants_enrichment, ChatAggregator, EnrichmentPolicy, ForecastSource, LocalForecasts,
    EMPTY_MESSAGE_REPLY,
};
pub use prediction_service::{PredictionService, DEFAULT_PREDICTION_TTL, PREDICTIONS_KEY};
pub use single_flight::SingleFlight;
pub use ttl_cache::{CacheError, CacheStore, MemoryCache};
