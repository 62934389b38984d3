use axum::{extract::State, http::HeaderMap, response::Json};
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::dto::auth_dto::{InitAdminPayload, LoginPayload, LoginResponse, PublicUser, SetupStatus};
use crate::error::Result;
use crate::middleware::auth::{claims_from_headers, issue_token};
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>> {
    payload.validate()?;
    let user = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;
    let token = issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    tracing::info!(user_id = user.id, "login succeeded");
    Ok(Json(LoginResponse {
        success: true,
        token,
        user: PublicUser::from(&user),
    }))
}

/// Never fails: a missing or stale token just reports `authenticated: false`.
#[axum::debug_handler]
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<JsonValue> {
    match claims_from_headers(&headers, &state.config.jwt_secret) {
        Ok(claims) => Json(json!({
            "success": true,
            "authenticated": true,
            "user": {
                "id": claims.uid,
                "email": claims.email,
                "name": claims.name,
                "username": claims.sub,
                "isAdmin": claims.is_admin(),
                "role": claims.role,
            }
        })),
        Err(_) => Json(json!({"success": true, "authenticated": false})),
    }
}

#[axum::debug_handler]
pub async fn needs_setup(State(state): State<AppState>) -> Result<Json<SetupStatus>> {
    Ok(Json(state.user_service.setup_status().await?))
}

#[axum::debug_handler]
pub async fn init_admin(
    State(state): State<AppState>,
    Json(payload): Json<InitAdminPayload>,
) -> Result<Json<JsonValue>> {
    payload.validate()?;
    state.user_service.init_admin(payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Admin user created successfully. You can now log in."
    })))
}
