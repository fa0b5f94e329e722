//! HTTP error boundary
//!
//! Every handler failure becomes an [`ApiError`]. Validation failures and
//! undecodable query strings carry their message back to the client as JSON;
//! anything else is logged and answered with a generic 500 so internal detail
//! never leaves the process.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use forecast_core::ForecastError;
use serde_json::json;
use tracing::error;

/// Body of every 500 response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug)]
pub enum ApiError {
    /// Failure from the service layer
    Forecast(ForecastError),
    /// Query string the extractor could not decode
    BadQuery(String),
}

impl<E> From<E> for ApiError
where
    E: Into<ForecastError>,
{
    fn from(err: E) -> Self {
        ApiError::Forecast(err.into())
    }
}

impl ApiError {
    pub fn bad_query(rejection: QueryRejection) -> Self {
        ApiError::BadQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadQuery(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Forecast(ForecastError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "reply": message }))).into_response()
            }
            ApiError::Forecast(other) => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}
