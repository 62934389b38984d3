pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::database::JsonStore;
use crate::error::{Error, Result};
use crate::services::{
    ai_service::GeminiClient, assessment_service::AssessmentService,
    competency_service::CompetencyService, event_service::EventService,
    grading_service::{Grader, GradingService}, marks_service::MarksService,
    media_service::{CloudinaryClient, MediaHost}, progress_service::ProgressService,
    speech_service::SpeechService, user_service::UserService,
};
use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: JsonStore,
    pub media: Arc<dyn MediaHost>,
    pub grader: Arc<dyn Grader>,
    pub gemini: GeminiClient,
    pub assessment_service: AssessmentService,
    pub event_service: EventService,
    pub marks_service: MarksService,
    pub user_service: UserService,
    pub progress_service: ProgressService,
    pub grading_service: GradingService,
    pub competency_service: CompetencyService,
    pub speech_service: SpeechService,
}

impl AppState {
    /// Wires the services to Cloudinary and Gemini as configured.
    pub fn new(config: Config, store: JsonStore) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client setup failed: {}", e)))?;

        let gemini = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            http_client.clone(),
        );
        let media = Arc::new(CloudinaryClient::new(
            config.cloudinary.clone(),
            http_client.clone(),
        ));
        let speech_service = SpeechService::new(config.azure_speech.clone(), http_client);

        Ok(Self::with_backends(
            config,
            store,
            media,
            Arc::new(gemini.clone()),
            gemini,
            speech_service,
        ))
    }

    /// Same wiring with the media host and grader supplied by the caller.
    pub fn with_backends(
        config: Config,
        store: JsonStore,
        media: Arc<dyn MediaHost>,
        grader: Arc<dyn Grader>,
        gemini: GeminiClient,
        speech_service: SpeechService,
    ) -> Self {
        let assessment_service = AssessmentService::new(store.clone());
        let event_service = EventService::new(store.clone());
        let marks_service = MarksService::new(store.clone());
        let user_service = UserService::new(store.clone());
        let progress_service = ProgressService::new(
            assessment_service.clone(),
            event_service.clone(),
            marks_service.clone(),
            user_service.clone(),
        );
        let grading_service = GradingService::new(
            event_service.clone(),
            marks_service.clone(),
            user_service.clone(),
        );
        let competency_service = CompetencyService::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            media,
            grader,
            gemini,
            assessment_service,
            event_service,
            marks_service,
            user_service,
            progress_service,
            grading_service,
            competency_service,
            speech_service,
        }
    }
}
