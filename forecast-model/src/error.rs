//! Error types for model loading and inference

use std::path::PathBuf;

use forecast_core::ForecastError;
use thiserror::Error;

/// Errors that can occur while loading or running a model
#[derive(Debug, Error)]
pub enum InferenceError {
    /// A model artifact does not exist on disk
    #[error("Model artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A model artifact exists but could not be read or parsed
    #[error("Malformed model artifact {}: {message}", path.display())]
    MalformedArtifact { path: PathBuf, message: String },

    /// Input row does not match the model's input width
    #[error("Input shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The model produced unusable output
    #[error("Backend fault: {0}")]
    Backend(String),
}

impl InferenceError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        InferenceError::MalformedArtifact {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<InferenceError> for ForecastError {
    fn from(err: InferenceError) -> Self {
        ForecastError::inference(err.to_string())
    }
}
