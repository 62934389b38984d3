use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::assessment::{Assessment, Video};
use crate::models::event::Event;
use crate::services::session_service::{QuestionGroup, SessionProgress};

/// Per-assessment counters for one student, keyed by assessment id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusForUser {
    pub answered: BTreeMap<String, usize>,
    pub video_progress: BTreeMap<String, usize>,
    pub total_videos: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeEntry {
    pub assessment: Assessment,
    pub answered_count: usize,
    pub video_progress: usize,
    pub total_videos: usize,
    pub all_done: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeBuckets {
    pub upcoming: Vec<HomeEntry>,
    pub expired: Vec<HomeEntry>,
    pub finished: Vec<HomeEntry>,
    pub completed_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardStatus {
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "In Progress")]
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub username: String,
    pub email: String,
    pub name: String,
    pub messages: Vec<Event>,
    pub groups: Vec<QuestionGroup>,
    pub progress: SessionProgress,
    pub response_count: usize,
    pub text_count: usize,
    pub voice_count: usize,
    pub video_progress: usize,
    pub marks: Option<f64>,
    pub last_activity: i64,
    pub status: BoardStatus,
    pub all_done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBoard {
    pub students: Vec<BoardRow>,
    pub total: usize,
    pub full_marks: Option<f64>,
    pub total_videos: usize,
    pub assessment_videos: Vec<Video>,
}
