use crate::database::{keys, JsonStore};
use crate::dto::assessment_dto::{CreateAssessmentPayload, UpdateAssessmentPayload};
use crate::error::{Error, Result};
use crate::models::assessment::{Assessment, AssessmentList};
use crate::models::marks::coerce_mark;
use crate::utils::time::{now, now_millis, to_rfc3339};
use crate::utils::token::generate_assessment_id;
use serde_json::Value as JsonValue;

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Zero, blank and non-numeric marks all mean "no full marks".
fn full_marks_from(raw: Option<&JsonValue>) -> Option<f64> {
    raw.and_then(coerce_mark).filter(|v| *v != 0.0)
}

#[derive(Clone)]
pub struct AssessmentService {
    store: JsonStore,
}

impl AssessmentService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<AssessmentList> {
        Ok(self
            .store
            .get_json::<AssessmentList>(keys::ASSESSMENTS)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, list: &AssessmentList) -> Result<()> {
        self.store.set_json(keys::ASSESSMENTS, list).await
    }

    pub async fn list(&self) -> Result<Vec<Assessment>> {
        Ok(self.load().await?.assessments)
    }

    pub async fn get(&self, id: &str) -> Result<Assessment> {
        self.load()
            .await?
            .find(id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))
    }

    pub async fn create(&self, payload: CreateAssessmentPayload) -> Result<Assessment> {
        let name = payload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::BadRequest("Name is required".to_string()))?
            .to_string();

        let stamp = to_rfc3339(now());
        let assessment = Assessment {
            id: generate_assessment_id(now_millis()),
            name,
            description: payload.description.unwrap_or_default().trim().to_string(),
            videos: payload.videos.unwrap_or_default(),
            deadline: blank_to_none(payload.deadline),
            full_marks: full_marks_from(payload.full_marks.as_ref()),
            video_public_id: blank_to_none(payload.video_public_id),
            video_url: blank_to_none(payload.video_url),
            video_thumb_url: blank_to_none(payload.video_thumb_url),
            video_filename: blank_to_none(payload.video_filename),
            created_at: Some(stamp.clone()),
            updated_at: Some(stamp),
        };

        let mut list = self.load().await?;
        list.assessments.push(assessment.clone());
        self.save(&list).await?;
        tracing::info!(assessment_id = %assessment.id, "assessment created");
        Ok(assessment)
    }

    pub async fn update(&self, id: &str, payload: UpdateAssessmentPayload) -> Result<Assessment> {
        let mut list = self.load().await?;
        let assessment = list
            .assessments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

        if let Some(name) = payload.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::BadRequest("Name is required".to_string()));
            }
            assessment.name = name.to_string();
        }
        if let Some(description) = payload.description {
            assessment.description = description.unwrap_or_default().trim().to_string();
        }
        if let Some(videos) = payload.videos {
            assessment.videos = videos.unwrap_or_default();
        }
        if let Some(deadline) = payload.deadline {
            assessment.deadline = blank_to_none(deadline);
        }
        if let Some(full_marks) = payload.full_marks {
            assessment.full_marks = full_marks_from(full_marks.as_ref());
        }
        if let Some(v) = payload.video_public_id {
            assessment.video_public_id = v;
        }
        if let Some(v) = payload.video_url {
            assessment.video_url = v;
        }
        if let Some(v) = payload.video_thumb_url {
            assessment.video_thumb_url = v;
        }
        if let Some(v) = payload.video_filename {
            assessment.video_filename = v;
        }
        assessment.updated_at = Some(to_rfc3339(now()));

        let updated = assessment.clone();
        self.save(&list).await?;
        Ok(updated)
    }

    /// Event logs and marks under this id are left in place.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut list = self.load().await?;
        let before = list.assessments.len();
        list.assessments.retain(|a| a.id != id);
        if list.assessments.len() == before {
            return Err(Error::NotFound("Assessment not found".to_string()));
        }
        self.save(&list).await?;
        tracing::info!(assessment_id = %id, "assessment deleted");
        Ok(())
    }
}
