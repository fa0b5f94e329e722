//! Prices passthrough endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;

use crate::{ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/prices", get(get_prices))
}

/// GET /api/prices - upstream spot prices, `null` when the feed answered with an error status
async fn get_prices(State(state): State<AppState>) -> Result<Json<Option<Value>>, ApiError> {
    Ok(Json(state.prices.fetch_prices().await?))
}
