use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::dto::grading_dto::{GradeResponse, SaveMarksPayload};
use crate::dto::progress_dto::ResponseBoard;
use crate::error::{Error, Result};
use crate::middleware::auth::{ensure_admin, Claims};
use crate::models::marks::coerce_mark;
use crate::services::progress_service::Viewer;
use crate::AppState;

#[axum::debug_handler]
pub async fn board(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<JsonValue>> {
    let assessment = state.assessment_service.get(&assessment_id).await?;
    let viewer = Viewer {
        username: claims.sub.clone(),
        is_admin: claims.is_admin(),
    };
    let board: ResponseBoard = state.progress_service.board(&assessment, &viewer).await?;
    let mut body = serde_json::to_value(&board)?;
    body["success"] = json!(true);
    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn save_marks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
    Json(payload): Json<SaveMarksPayload>,
) -> Result<Json<JsonValue>> {
    ensure_admin(&claims)?;
    payload.validate()?;
    let mark = coerce_mark(&payload.marks);
    state
        .marks_service
        .set_mark(&assessment_id, &payload.username, mark)
        .await?;
    Ok(Json(json!({"success": true, "username": payload.username, "marks": mark})))
}

#[axum::debug_handler]
pub async fn grade(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<GradeResponse>> {
    ensure_admin(&claims)?;
    if !state.grader.is_configured() {
        return Err(Error::Config("Gemini API not configured".to_string()));
    }
    let assessment = state.assessment_service.get(&assessment_id).await?;
    let results = state
        .grading_service
        .grade_assessment(&assessment, state.grader.as_ref())
        .await?;
    Ok(Json(GradeResponse {
        success: true,
        results,
    }))
}
