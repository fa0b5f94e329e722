//! News passthrough endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use forecast_core::NewsQuery;
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiError, AppState};

/// Query parameters for the news feed
#[derive(Debug, Deserialize)]
struct NewsParams {
    tickers: Option<String>,
    items: Option<u32>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/news", get(get_news))
}

/// GET /api/news - upstream news JSON, `null` when the feed answered with an error status
async fn get_news(
    State(state): State<AppState>,
    params: Result<Query<NewsParams>, QueryRejection>,
) -> Result<Json<Option<Value>>, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_query)?;
    let query = NewsQuery::new(params.tickers, params.items);
    Ok(Json(state.news.fetch_news(&query).await?))
}
