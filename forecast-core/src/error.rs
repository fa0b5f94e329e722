//! Error types for the terminal

use thiserror::Error;

/// Terminal-wide error type
///
/// Cloneable so a single result can be handed to every caller waiting on
/// the same in-flight computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Bad or missing client input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A dependent service was unreachable or answered with a failure
    #[error("Upstream error ({service}): {message}")]
    Upstream { service: String, message: String },

    /// The model could not produce a score
    #[error("Inference error: {0}")]
    Inference(String),

    /// The cache backend could not be reached
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ForecastError::Validation(msg.into())
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        ForecastError::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        ForecastError::Inference(msg.into())
    }

    pub fn cache_unavailable(msg: impl Into<String>) -> Self {
        ForecastError::CacheUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ForecastError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ForecastError::Internal(msg.into())
    }

    /// Whether this error is the client's fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForecastError::Validation(_))
    }
}

/// Result type alias for terminal operations
pub type ForecastResult<T> = Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_client_error() {
        assert!(ForecastError::validation("empty").is_client_error());
        assert!(!ForecastError::upstream("news", "502").is_client_error());
        assert!(!ForecastError::inference("shape").is_client_error());
        assert!(!ForecastError::internal("boom").is_client_error());
    }

    #[test]
    fn test_upstream_display_names_service() {
        let err = ForecastError::upstream("prices", "connection refused");
        assert_eq!(err.to_string(), "Upstream error (prices): connection refused");
    }
}
