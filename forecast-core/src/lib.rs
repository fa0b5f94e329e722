//! Core types for the Forecast Terminal
//!
//! This crate defines the shared data structures used across the terminal,
//! including prediction vectors, derived forecast horizons, news queries,
//! and the error taxonomy every service layer maps into.

pub mod error;
pub mod news;
pub mod prediction;

pub use error::{ForecastError, ForecastResult};
pub use news::{NewsQuery, DEFAULT_NEWS_ITEMS, DEFAULT_NEWS_TICKERS};
pub use prediction::{ForecastMap, PredictionTriple, PredictionVector};
