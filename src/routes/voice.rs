use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::services::ai_service::ChatMessage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceChatPayload {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[axum::debug_handler]
pub async fn speech_token(State(state): State<AppState>) -> Result<Json<JsonValue>> {
    let (token, region) = state.speech_service.issue_token().await?;
    Ok(Json(json!({"success": true, "token": token, "region": region})))
}

#[axum::debug_handler]
pub async fn voice_chat(
    State(state): State<AppState>,
    Json(payload): Json<VoiceChatPayload>,
) -> Result<Json<JsonValue>> {
    if payload.messages.is_empty() {
        return Err(Error::BadRequest("Messages array is required".to_string()));
    }
    let reply = state
        .gemini
        .voice_chat(&payload.messages, payload.topic.as_deref())
        .await?;
    Ok(Json(json!({"success": true, "reply": reply})))
}
