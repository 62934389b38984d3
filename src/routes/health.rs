use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let redis_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            "error"
        }
    };
    let body = json!({
        "success": true,
        "status": "ok",
        "timestamp": crate::utils::time::to_rfc3339(crate::utils::time::now()),
        "store": state.store.backend_tag(),
        "redis": redis_status,
    });
    (StatusCode::OK, Json(body))
}
