use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::dto::auth_dto::{CreateStudentPayload, PublicUser, UpdateUserPayload};
use crate::error::Result;
use crate::middleware::auth::{ensure_admin, Claims};
use crate::AppState;

#[axum::debug_handler]
pub async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<CreateStudentPayload>,
) -> Result<Json<JsonValue>> {
    payload.validate()?;
    let user = state.user_service.create_student(payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Student created",
        "user": PublicUser::from(&user),
    })))
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<JsonValue>> {
    let users: Vec<PublicUser> = state
        .user_service
        .load()
        .await?
        .users
        .iter()
        .map(PublicUser::from)
        .collect();
    Ok(Json(json!({"success": true, "users": users})))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<JsonValue>> {
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": PublicUser::from(&user),
    })))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<u64>,
) -> Result<Json<JsonValue>> {
    state.user_service.delete(id, claims.uid).await?;
    Ok(Json(json!({"success": true, "message": "User deleted successfully"})))
}

#[axum::debug_handler]
pub async fn students(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<JsonValue>> {
    ensure_admin(&claims)?;
    let students = state.user_service.students().await?;
    Ok(Json(json!({"success": true, "students": students})))
}
