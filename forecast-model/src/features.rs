//! Model input construction

use crate::error::InferenceError;

/// Supplies the input row for each inference call
pub trait FeatureSource: Send + Sync {
    fn features(&self) -> Result<Vec<f32>, InferenceError>;
}

/// A fixed input row
///
/// Live feature computation is not wired in yet; the row comes from
/// configuration, or is all zeros when none is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFeatures {
    values: Vec<f32>,
}

impl StaticFeatures {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// All-zero row of the given width
    pub fn zeros(width: usize) -> Self {
        Self::new(vec![0.0; width])
    }

    /// Parse a comma-separated list such as `"0.1, 0.2,0.3"`
    pub fn parse(raw: &str) -> Result<Self, InferenceError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f32>()
                    .map_err(|e| InferenceError::Backend(format!("invalid feature value '{}': {}", s, e)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

impl FeatureSource for StaticFeatures {
    fn features(&self) -> Result<Vec<f32>, InferenceError> {
        Ok(self.values.clone())
    }
}
