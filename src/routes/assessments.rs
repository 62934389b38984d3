use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value as JsonValue};

use crate::dto::assessment_dto::{
    AssessmentListResponse, AssessmentResponse, CreateAssessmentPayload, UpdateAssessmentPayload,
};
use crate::dto::progress_dto::HomeBuckets;
use crate::error::Result;
use crate::middleware::auth::{ensure_admin, Claims};
use crate::utils::time::now;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_assessments(State(state): State<AppState>) -> Result<Json<AssessmentListResponse>> {
    Ok(Json(AssessmentListResponse {
        success: true,
        assessments: state.assessment_service.list().await?,
    }))
}

#[axum::debug_handler]
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentResponse>> {
    Ok(Json(AssessmentResponse {
        success: true,
        assessment: state.assessment_service.get(&id).await?,
    }))
}

#[axum::debug_handler]
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssessmentPayload>,
) -> Result<Json<AssessmentResponse>> {
    ensure_admin(&claims)?;
    Ok(Json(AssessmentResponse {
        success: true,
        assessment: state.assessment_service.create(payload).await?,
    }))
}

#[axum::debug_handler]
pub async fn update_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAssessmentPayload>,
) -> Result<Json<AssessmentResponse>> {
    ensure_admin(&claims)?;
    Ok(Json(AssessmentResponse {
        success: true,
        assessment: state.assessment_service.update(&id, payload).await?,
    }))
}

#[axum::debug_handler]
pub async fn delete_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>> {
    ensure_admin(&claims)?;
    state.assessment_service.delete(&id).await?;
    Ok(Json(json!({"success": true})))
}

#[axum::debug_handler]
pub async fn status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<JsonValue>> {
    let status = state.progress_service.status_for_user(&claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "answered": status.answered,
        "videoProgress": status.video_progress,
        "totalVideos": status.total_videos,
    })))
}

#[axum::debug_handler]
pub async fn home(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<HomeBuckets>> {
    Ok(Json(
        state
            .progress_service
            .home_for_user(&claims.sub, now())
            .await?,
    ))
}
