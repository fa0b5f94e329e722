//! Prediction endpoint

use axum::{extract::State, routing::get, Json, Router};
use forecast_core::PredictionTriple;

use crate::{ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/predictions", get(get_predictions))
}

/// GET /api/predictions - next hour/day/week forecast
async fn get_predictions(State(state): State<AppState>) -> Result<Json<PredictionTriple>, ApiError> {
    Ok(Json(state.predictions.get_triple().await?))
}
