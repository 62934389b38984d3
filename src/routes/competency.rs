use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use validator::Validate;

use crate::dto::competency_dto::{
    CompetencyResponse, SaveCompetencyPayload, ScoreUpdateResponse, UpdateScorePayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::{ensure_admin, Claims};
use crate::models::competency::CompetencyRecord;
use crate::AppState;

pub async fn template() -> Json<CompetencyResponse> {
    let record = CompetencyRecord::default_template();
    let summary = record.summary();
    Json(CompetencyResponse {
        success: true,
        data: Some(record),
        summary: Some(summary),
    })
}

/// Students may read only their own scorecard.
#[axum::debug_handler]
pub async fn get_competency(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<Json<CompetencyResponse>> {
    if !claims.is_admin() && claims.sub != username {
        return Err(Error::Forbidden("Access denied".to_string()));
    }
    let record = state.competency_service.get(&username).await?;
    let summary = record.as_ref().map(CompetencyRecord::summary);
    Ok(Json(CompetencyResponse {
        success: true,
        data: record,
        summary,
    }))
}

#[axum::debug_handler]
pub async fn save_competency(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    Json(payload): Json<SaveCompetencyPayload>,
) -> Result<Json<CompetencyResponse>> {
    ensure_admin(&claims)?;
    let record = state.competency_service.save(&username, payload).await?;
    let summary = record.summary();
    Ok(Json(CompetencyResponse {
        success: true,
        data: Some(record),
        summary: Some(summary),
    }))
}

#[axum::debug_handler]
pub async fn update_score(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateScorePayload>,
) -> Result<Json<ScoreUpdateResponse>> {
    ensure_admin(&claims)?;
    payload.validate()?;
    let (competency, label, summary) = state
        .competency_service
        .update_score(&username, payload.index, payload.field, payload.value)
        .await?;
    Ok(Json(ScoreUpdateResponse {
        success: true,
        competency,
        gap_label: label.to_string(),
        summary,
    }))
}
