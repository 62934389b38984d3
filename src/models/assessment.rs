use serde::{Deserialize, Deserializer, Serialize};

use crate::models::lenient::null_as_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl Video {
    /// Blank strings count as "no question".
    pub fn question_text(&self) -> Option<&str> {
        self.question.as_deref().filter(|q| !q.trim().is_empty())
    }

    pub fn correct_answer_text(&self) -> Option<&str> {
        self.correct_answer.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub full_marks: Option<f64>,
    #[serde(default)]
    pub video_public_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_thumb_url: Option<String>,
    #[serde(default)]
    pub video_filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Assessment {
    /// Older records carry a single video in the `video*` fields instead of `videos`.
    pub fn total_videos(&self) -> usize {
        if !self.videos.is_empty() {
            self.videos.len()
        } else if self.video_public_id.is_some() {
            1
        } else {
            0
        }
    }

    pub fn deadline_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.deadline
            .as_deref()
            .and_then(crate::utils::time::parse_deadline)
    }

    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.deadline_at().map(|dl| dl < now).unwrap_or(false)
    }

    /// Per-question share of `fullMarks`, or 1 when the assessment has no full marks.
    pub fn marks_per_question(&self) -> f64 {
        let questions = self
            .videos
            .iter()
            .filter(|v| v.question_text().is_some())
            .count()
            .max(1);
        match self.full_marks {
            Some(full) if full > 0.0 => full / questions as f64,
            _ => 1.0,
        }
    }
}

fn lenient_marks<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(crate::models::marks::coerce_mark(&raw))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentList {
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl AssessmentList {
    pub fn find(&self, id: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == id)
    }
}
