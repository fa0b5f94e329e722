//! Model loading and inference for the Forecast Terminal
//!
//! This crate provides:
//! - [`Predictor`]: the scoring capability the service layer is handed at startup
//! - [`DenseModel`]: a feed-forward network loaded from an architecture
//!   descriptor plus a packed weights file
//! - [`FeatureSource`]: where each inference call gets its input row

pub mod dense;
pub mod error;
pub mod features;

pub use dense::{Activation, Architecture, DenseModel, LayerSpec};
pub use error::InferenceError;
pub use features::{FeatureSource, StaticFeatures};

use forecast_core::PredictionVector;

/// A loaded scoring model
///
/// Implementations may be slow and CPU-bound. Callers must not assume an
/// implementation is safe to invoke concurrently beyond what `Sync` gives them.
pub trait Predictor: Send + Sync {
    /// Number of features each input row must carry
    fn input_dim(&self) -> usize;

    /// Score one input row
    fn predict(&self, input: &[f32]) -> Result<PredictionVector, InferenceError>;
}
