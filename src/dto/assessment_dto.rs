use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::assessment::{Assessment, Video};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub videos: Option<Vec<Video>>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub full_marks: Option<JsonValue>,
    #[serde(default)]
    pub video_public_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_thumb_url: Option<String>,
    #[serde(default)]
    pub video_filename: Option<String>,
}

/// Every field is optional; `null` clears a nullable field, absence leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub videos: Option<Option<Vec<Video>>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub full_marks: Option<Option<JsonValue>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub video_public_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub video_thumb_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub video_filename: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentListResponse {
    pub success: bool,
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse {
    pub success: bool,
    pub assessment: Assessment,
}
