//! Error types for the upstream clients

use forecast_core::ForecastError;
use thiserror::Error;

/// Errors that can occur talking to an upstream service
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Upstream did not answer within the client's timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Failed to parse API response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::ParseError(err.to_string())
        } else {
            UpstreamError::RequestFailed(err.to_string())
        }
    }
}

impl From<UpstreamError> for ForecastError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidConfig(msg) => ForecastError::config(msg),
            other => ForecastError::upstream("upstream", other.to_string()),
        }
    }
}
