use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    Extension,
};
use bytes::Bytes;
use serde_json::{json, Value as JsonValue};

use crate::dto::event_dto::{
    AppendCommand, AppendEventPayload, AppendEventResponse, MessagesResponse,
    VoiceUploadResponse,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::event::{sort_chronologically, Event};
use crate::utils::time::now_millis;
use crate::AppState;

/// Reading does not check that the assessment still exists.
#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<MessagesResponse>> {
    let mut messages = state.event_service.list(&assessment_id, &claims.sub).await?;
    sort_chronologically(&mut messages);
    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}

#[axum::debug_handler]
pub async fn append_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
    Json(payload): Json<AppendEventPayload>,
) -> Result<Json<AppendEventResponse>> {
    state.assessment_service.get(&assessment_id).await?;
    let command = payload
        .command()
        .ok_or_else(|| Error::BadRequest("Text is required".to_string()))?;
    let username = claims.sub.as_str();

    let response = match command {
        AppendCommand::VideoShown(index) => AppendEventResponse {
            success: true,
            recorded: state
                .event_service
                .record_video_shown(&assessment_id, username, index)
                .await?,
            message: None,
        },
        AppendCommand::VideoProgress(count) => AppendEventResponse {
            success: true,
            recorded: true,
            message: Some(
                state
                    .event_service
                    .record_video_progress(&assessment_id, username, count)
                    .await?,
            ),
        },
        AppendCommand::Text(text) => AppendEventResponse {
            success: true,
            recorded: true,
            message: Some(
                state
                    .event_service
                    .append(&assessment_id, username, Event::text(text, now_millis()))
                    .await?,
            ),
        },
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn upload_voice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VoiceUploadResponse>> {
    let mut audio: Option<(Bytes, String, String)> = None;
    let mut transcript: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio" => {
                let filename = field.file_name().unwrap_or("recording.webm").to_string();
                let content_type = field.content_type().unwrap_or("audio/webm").to_string();
                let data = field.bytes().await.map_err(Error::Multipart)?;
                audio = Some((data, filename, content_type));
            }
            "transcript" => {
                let text = field.text().await.map_err(Error::Multipart)?;
                transcript = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    let (data, filename, content_type) = audio
        .filter(|(data, _, _)| !data.is_empty())
        .ok_or_else(|| Error::BadRequest("No audio file uploaded".to_string()))?;
    state.assessment_service.get(&assessment_id).await?;

    let username = claims.sub.clone();
    let timestamp = now_millis();
    let folder = format!("assessment_recordings/{}/{}", assessment_id, username);
    let public_id = format!("recording_{}", timestamp);
    let format = if filename.ends_with(".mp4") { "mp4" } else { "webm" };
    tracing::info!(%assessment_id, %username, bytes = data.len(), "uploading voice answer");

    let uploaded = state
        .media
        .upload_audio(&folder, &public_id, data, &content_type, format)
        .await?;

    let event = Event::voice(
        uploaded.url.clone(),
        Some(uploaded.public_id.clone()),
        transcript.clone(),
        uploaded.format.clone(),
        timestamp,
    );
    state
        .event_service
        .append(&assessment_id, &username, event)
        .await?;

    Ok(Json(VoiceUploadResponse {
        success: true,
        url: uploaded.url,
        public_id: uploaded.public_id,
        assessment_id,
        username,
        transcript,
    }))
}

/// Retest: empties the log and removes uploaded recordings. Media removal is best effort.
#[axum::debug_handler]
pub async fn clear_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let removed = state.event_service.clear(&assessment_id, &claims.sub).await?;
    for event in &removed {
        if let Event::Voice {
            public_id: Some(public_id),
            ..
        } = event
        {
            if let Err(e) = state.media.destroy(public_id).await {
                tracing::warn!(%public_id, error = %e, "could not delete recording");
            }
        }
    }
    tracing::info!(%assessment_id, username = %claims.sub, deleted = removed.len(), "answers cleared");
    Ok(Json(json!({"success": true, "deleted": removed.len()})))
}
