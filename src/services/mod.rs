pub mod ai_service;
pub mod assessment_service;
pub mod competency_service;
pub mod event_service;
pub mod grading_service;
pub mod marks_service;
pub mod media_service;
pub mod progress_service;
pub mod session_service;
pub mod speech_service;
pub mod user_service;
