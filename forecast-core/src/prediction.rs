//! Prediction data structures
//!
//! A [`PredictionVector`] is the raw output of one inference call. The
//! externally visible forecast is a [`PredictionTriple`] derived from the
//! vector's first element by fixed scaling.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Hours in a day, used to scale the next-hour value
pub const HOURS_PER_DAY: f64 = 24.0;

/// Hours in a week, used to scale the next-hour value
pub const HOURS_PER_WEEK: f64 = 24.0 * 7.0;

/// Ordered scores produced by a single inference call
///
/// Never empty. The first element is the canonical next-hour value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionVector(Vec<f32>);

impl PredictionVector {
    /// Wrap raw model output, rejecting an empty vector
    pub fn new(values: Vec<f32>) -> ForecastResult<Self> {
        if values.is_empty() {
            return Err(ForecastError::inference("model produced an empty prediction vector"));
        }
        Ok(Self(values))
    }

    /// The canonical next-hour score
    pub fn next_hour(&self) -> f32 {
        self.0[0]
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pack into little-endian `f32` bytes for the cache
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Unpack a cache payload written by [`PredictionVector::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> ForecastResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(ForecastError::internal(format!(
                "cached prediction payload has {} bytes, not a multiple of 4",
                bytes.len()
            )));
        }

        let values = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Self::new(values)
    }

    /// Derive the next hour/day/week forecast
    pub fn triple(&self) -> PredictionTriple {
        PredictionTriple::from_next_hour(self.next_hour() as f64)
    }
}

/// Forecast for the three served horizons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionTriple {
    pub next_hour: f64,
    pub next_day: f64,
    pub next_week: f64,
}

impl PredictionTriple {
    /// Day and week values are scaled from the hourly one, not modelled separately
    pub fn from_next_hour(next_hour: f64) -> Self {
        Self {
            next_hour,
            next_day: next_hour * HOURS_PER_DAY,
            next_week: next_hour * HOURS_PER_WEEK,
        }
    }
}

/// Per-asset forecasts in the order they were received
pub type ForecastMap = IndexMap<String, PredictionTriple>;
