use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};

use crate::dto::event_dto::SessionResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::event::Event;
use crate::services::session_service::{AdvanceBlocked, AnswerSession};
use crate::utils::time::{now, now_millis};
use crate::AppState;

/// Checkpoint markers are written through one by one; a failed write is logged
/// and the in-memory session stays authoritative for this response.
async fn persist_writes(state: &AppState, assessment_id: &str, username: &str, writes: Vec<Event>) {
    for event in writes {
        if let Err(e) = state
            .event_service
            .persist(assessment_id, username, event)
            .await
        {
            tracing::warn!(%assessment_id, %username, error = %e, "could not save session marker");
        }
    }
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let assessment = state.assessment_service.get(&assessment_id).await?;
    let events = state.event_service.list(&assessment_id, &claims.sub).await?;

    let mut session = AnswerSession::new(&assessment, events);
    let writes = session.open(now_millis());
    persist_writes(&state, &assessment_id, &claims.sub, writes).await;

    Ok(Json(SessionResponse {
        success: true,
        view: session.view(),
    }))
}

#[axum::debug_handler]
pub async fn advance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let assessment = state.assessment_service.get(&assessment_id).await?;
    let events = state.event_service.list(&assessment_id, &claims.sub).await?;

    let mut session = AnswerSession::new(&assessment, events);
    let writes = session.advance(now(), now_millis()).map_err(|blocked| match blocked {
        AdvanceBlocked::Closed | AdvanceBlocked::Unanswered => Error::Forbidden(blocked.to_string()),
        AdvanceBlocked::NoNextVideo => Error::BadRequest(blocked.to_string()),
    })?;
    persist_writes(&state, &assessment_id, &claims.sub, writes).await;

    Ok(Json(SessionResponse {
        success: true,
        view: session.view(),
    }))
}
