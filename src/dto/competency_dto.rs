use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::competency::{Competency, CompetencyRecord, CompetencySummary, ScoreField};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCompetencyPayload {
    #[serde(default)]
    pub personnel_type: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub standard_level: Option<String>,
    #[serde(default)]
    pub competencies: Option<Vec<Competency>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateScorePayload {
    pub index: usize,
    pub field: ScoreField,
    #[validate(range(min = 0, max = 5, message = "Scores range from 0 to 5"))]
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetencyResponse {
    pub success: bool,
    pub data: Option<CompetencyRecord>,
    pub summary: Option<CompetencySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateResponse {
    pub success: bool,
    pub competency: Competency,
    pub gap_label: String,
    pub summary: CompetencySummary,
}
