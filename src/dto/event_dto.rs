use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::event::Event;
use crate::models::lenient::{loose_int, parse_leading_int};
use crate::services::session_service::SessionView;

const PROGRESS_PREFIX: &str = "__video_progress__";

/// Body of `POST /api/assessments/:id/events`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventPayload {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub video_index: Option<JsonValue>,
    #[serde(default)]
    pub video_count: Option<JsonValue>,
}

fn non_negative(n: Option<i64>) -> usize {
    n.and_then(|n| usize::try_from(n).ok()).unwrap_or(0)
}

/// A number or string field is read loosely; anything else falls back to `text`.
fn loose_count(raw: Option<&JsonValue>) -> Option<usize> {
    match raw? {
        v @ (JsonValue::Number(_) | JsonValue::String(_)) => Some(non_negative(loose_int(v))),
        _ => None,
    }
}

/// What an append request asks for, after the loose field rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendCommand {
    VideoShown(usize),
    VideoProgress(usize),
    Text(String),
}

impl AppendEventPayload {
    pub fn command(&self) -> Option<AppendCommand> {
        let text = self.text.as_deref().unwrap_or_default();
        match self.kind.as_deref() {
            Some("video_shown") => Some(AppendCommand::VideoShown(
                loose_count(self.video_index.as_ref())
                    .unwrap_or_else(|| non_negative(parse_leading_int(text))),
            )),
            Some("video_progress") => Some(AppendCommand::VideoProgress(
                loose_count(self.video_count.as_ref()).unwrap_or_else(|| {
                    non_negative(parse_leading_int(&text.replace(PROGRESS_PREFIX, "")))
                }),
            )),
            _ => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| AppendCommand::Text(trimmed.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppendEventResponse {
    pub success: bool,
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Event>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUploadResponse {
    pub success: bool,
    pub url: String,
    pub public_id: String,
    pub assessment_id: String,
    pub username: String,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub view: SessionView,
}
