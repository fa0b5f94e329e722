//! Feed-forward network loader
//!
//! A model ships as two files:
//! - an architecture descriptor (JSON) naming the input width and each dense
//!   layer's size and activation
//! - a weights file of packed little-endian `f32`, holding for each layer in
//!   order its kernel (`inputs x units`, row-major) followed by its bias

use std::fs;
use std::path::Path;

use forecast_core::PredictionVector;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::InferenceError;
use crate::Predictor;

/// Activation applied after a dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }
}

/// One dense layer in the architecture descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    #[serde(default)]
    pub activation: Activation,
}

/// Architecture descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Width of the input row
    pub input_dim: usize,
    pub layers: Vec<LayerSpec>,
}

impl Architecture {
    /// Total number of `f32` parameters the weights file must hold
    pub fn parameter_count(&self) -> usize {
        let mut inputs = self.input_dim;
        let mut total = 0;
        for layer in &self.layers {
            total += inputs * layer.units + layer.units;
            inputs = layer.units;
        }
        total
    }

    fn validate(&self) -> Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be positive".to_string());
        }
        if self.layers.is_empty() {
            return Err("architecture has no layers".to_string());
        }
        if let Some(idx) = self.layers.iter().position(|l| l.units == 0) {
            return Err(format!("layer {} has zero units", idx));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    /// `inputs x units`
    kernel: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn units(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        let activation = self.activation;
        (x.dot(&self.kernel) + &self.bias).mapv(|v| activation.apply(v))
    }
}

/// Fully-connected feed-forward model
#[derive(Debug, Clone)]
pub struct DenseModel {
    input_dim: usize,
    layers: Vec<DenseLayer>,
}

impl DenseModel {
    /// Load a model from its architecture descriptor and weights file
    pub fn load(
        architecture_path: impl AsRef<Path>,
        weights_path: impl AsRef<Path>,
    ) -> Result<Self, InferenceError> {
        let architecture_path = architecture_path.as_ref();
        let weights_path = weights_path.as_ref();

        for path in [architecture_path, weights_path] {
            if !path.exists() {
                return Err(InferenceError::ArtifactMissing(path.to_path_buf()));
            }
        }

        info!(
            architecture = %architecture_path.display(),
            weights = %weights_path.display(),
            "Loading forecast model"
        );

        let descriptor = fs::read_to_string(architecture_path)
            .map_err(|e| InferenceError::malformed(architecture_path, e.to_string()))?;
        let architecture: Architecture = serde_json::from_str(&descriptor)
            .map_err(|e| InferenceError::malformed(architecture_path, e.to_string()))?;
        architecture
            .validate()
            .map_err(|msg| InferenceError::malformed(architecture_path, msg))?;

        let bytes = fs::read(weights_path)
            .map_err(|e| InferenceError::malformed(weights_path, e.to_string()))?;
        if bytes.len() % 4 != 0 {
            return Err(InferenceError::malformed(
                weights_path,
                format!("{} bytes is not a whole number of f32 values", bytes.len()),
            ));
        }
        let weights: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let model = Self::from_parts(architecture, weights).map_err(|e| match e {
            InferenceError::MalformedArtifact { message, .. } => {
                InferenceError::malformed(weights_path, message)
            }
            other => other,
        })?;

        info!(
            input_dim = model.input_dim,
            layers = model.layers.len(),
            "Forecast model loaded successfully"
        );
        Ok(model)
    }

    /// Build a model from an architecture and a flat parameter list
    pub fn from_parts(architecture: Architecture, weights: Vec<f32>) -> Result<Self, InferenceError> {
        architecture
            .validate()
            .map_err(|msg| InferenceError::malformed("<architecture>", msg))?;

        let expected = architecture.parameter_count();
        if weights.len() != expected {
            return Err(InferenceError::malformed(
                "<weights>",
                format!("expected {} parameters, found {}", expected, weights.len()),
            ));
        }

        let mut layers = Vec::with_capacity(architecture.layers.len());
        let mut params = weights.into_iter();
        let mut inputs = architecture.input_dim;

        for layer_spec in &architecture.layers {
            let kernel: Vec<f32> = params.by_ref().take(inputs * layer_spec.units).collect();
            let kernel = Array2::from_shape_vec((inputs, layer_spec.units), kernel)
                .map_err(|e| InferenceError::malformed("<weights>", e.to_string()))?;
            let bias: Array1<f32> = params.by_ref().take(layer_spec.units).collect();

            layers.push(DenseLayer {
                kernel,
                bias,
                activation: layer_spec.activation,
            });
            inputs = layer_spec.units;
        }

        Ok(Self {
            input_dim: architecture.input_dim,
            layers,
        })
    }

    /// Width of the final layer
    pub fn output_dim(&self) -> usize {
        self.layers.last().map(DenseLayer::units).unwrap_or(0)
    }
}

impl Predictor for DenseModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, input: &[f32]) -> Result<PredictionVector, InferenceError> {
        if input.len() != self.input_dim {
            return Err(InferenceError::ShapeMismatch {
                expected: self.input_dim,
                actual: input.len(),
            });
        }

        let output = self
            .layers
            .iter()
            .fold(Array1::from(input.to_vec()), |x, layer| layer.forward(&x))
            .to_vec();

        if output.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::Backend("model produced a non-finite score".to_string()));
        }

        debug!(outputs = output.len(), "Inference complete");
        PredictionVector::new(output).map_err(|e| InferenceError::Backend(e.to_string()))
    }
}
