//! Chat endpoint

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use forecast_core::ForecastError;
use forecast_services::EMPTY_MESSAGE_REPLY;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// POST /api/chat - generated reply, enriched for recommendation requests
///
/// The body is read raw so a malformed or missing JSON body is answered like
/// a missing message instead of with the extractor's rejection.
async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>, ApiError> {
    let message = serde_json::from_slice::<ChatRequest>(&body)
        .inspect_err(|e| debug!("Unreadable chat body: {}", e))
        .ok()
        .and_then(|req| req.message)
        .unwrap_or_default();

    if message.trim().is_empty() {
        return Err(ForecastError::validation(EMPTY_MESSAGE_REPLY).into());
    }

    let chat = state
        .chat
        .as_ref()
        .ok_or_else(|| ForecastError::config("chat is not configured, set OPENAI_API_KEY"))?;

    let reply = chat.reply(&message).await?;
    Ok(Json(ChatResponse { reply }))
}
