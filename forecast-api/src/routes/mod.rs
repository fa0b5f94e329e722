//! API route definitions

mod chat;
mod health;
mod news;
mod predictions;
mod prices;

use axum::Router;

use crate::AppState;

/// Create all `/api` routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(predictions::routes())
        .merge(chat::routes())
        .merge(news::routes())
        .merge(prices::routes())
}

/// Create health routes (served outside `/api`)
pub fn health_routes() -> Router<AppState> {
    health::routes()
}
