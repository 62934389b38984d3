pub mod admin;
pub mod assessments;
pub mod auth;
pub mod competency;
pub mod health;
pub mod messages;
pub mod responses;
pub mod session;
pub mod voice;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::{require_admin, require_auth};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.upload_limit_mb * 1024 * 1024;

    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/status", get(auth::status))
        .route("/auth/needs-setup", get(auth::needs_setup))
        .route("/admin/init", post(auth::init_admin));

    let api = Router::new()
        .route(
            "/api/assessments",
            get(assessments::list_assessments).post(assessments::create_assessment),
        )
        .route("/api/assessments/status", get(assessments::status))
        .route(
            "/api/assessments/:id",
            get(assessments::get_assessment)
                .put(assessments::update_assessment)
                .delete(assessments::delete_assessment),
        )
        .route(
            "/api/assessments/:id/messages",
            get(messages::list_messages).delete(messages::clear_messages),
        )
        .route("/api/assessments/:id/events", post(messages::append_event))
        .route("/api/assessments/:id/voice", post(messages::upload_voice))
        .route("/api/assessments/:id/session", get(session::get_session))
        .route("/api/assessments/:id/advance", post(session::advance))
        .route("/api/assessments/:id/responses", get(responses::board))
        .route("/api/assessments/:id/marks", post(responses::save_marks))
        .route("/api/assessments/:id/grade", post(responses::grade))
        .route("/api/home", get(assessments::home))
        .route("/api/students", get(admin::students))
        .route("/api/competency/template", get(competency::template))
        .route(
            "/api/competency/:username",
            get(competency::get_competency).post(competency::save_competency),
        )
        .route(
            "/api/competency/:username/scores",
            patch(competency::update_score),
        )
        .route("/api/speech-token", get(voice::speech_token))
        .route("/api/voice-chat", post(voice::voice_chat))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin_api = Router::new()
        .route("/admin/students", post(admin::create_student))
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    base_routes
        .merge(api)
        .merge(admin_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}
