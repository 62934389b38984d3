use crate::database::{keys, JsonStore};
use crate::dto::competency_dto::SaveCompetencyPayload;
use crate::error::{Error, Result};
use crate::models::competency::{gap_label, Competency, CompetencyRecord, CompetencySummary, ScoreField};
use crate::utils::time::now_millis;
use validator::Validate;

fn header_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Clone)]
pub struct CompetencyService {
    store: JsonStore,
}

impl CompetencyService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, username: &str) -> Result<Option<CompetencyRecord>> {
        let record = self
            .store
            .get_json::<CompetencyRecord>(&keys::competency(username))
            .await?;
        Ok(record.map(|mut r| {
            r.normalize();
            r
        }))
    }

    /// Whole-record save. Gaps are recomputed, whatever the client sent.
    pub async fn save(&self, username: &str, payload: SaveCompetencyPayload) -> Result<CompetencyRecord> {
        let competencies = payload
            .competencies
            .ok_or_else(|| Error::BadRequest("competencies array required".to_string()))?;
        for row in &competencies {
            row.validate()?;
        }
        let template = CompetencyRecord::default_template();

        let mut record = CompetencyRecord {
            personnel_type: header_or(payload.personnel_type, &template.personnel_type),
            level: header_or(payload.level, &template.level),
            standard_level: header_or(payload.standard_level, &template.standard_level),
            competencies,
            updated_at: Some(now_millis()),
        };
        record.normalize();

        self.store
            .set_json(&keys::competency(username), &record)
            .await?;
        tracing::info!(username, rows = record.competencies.len(), "competency record saved");
        Ok(record)
    }

    /// Edits one score on an existing record, or on a fresh template when none is stored yet.
    pub async fn update_score(
        &self,
        username: &str,
        index: usize,
        field: ScoreField,
        value: i64,
    ) -> Result<(Competency, &'static str, CompetencySummary)> {
        let mut record = self
            .get(username)
            .await?
            .unwrap_or_else(CompetencyRecord::default_template);

        let row = record
            .competencies
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("No competency at index {}", index)))?;
        row.set_score(field, value);
        let row = row.clone();

        record.updated_at = Some(now_millis());
        self.store
            .set_json(&keys::competency(username), &record)
            .await?;
        let label = gap_label(row.gap);
        Ok((row, label, record.summary()))
    }
}
