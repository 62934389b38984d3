use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::dto::progress_dto::{
    BoardRow, BoardStatus, HomeBuckets, HomeEntry, ResponseBoard, StatusForUser,
};
use crate::error::Result;
use crate::models::assessment::Assessment;
use crate::models::event::{sort_chronologically, Event};
use crate::models::marks::MarksSheet;
use crate::models::user::User;
use crate::services::assessment_service::AssessmentService;
use crate::services::event_service::EventService;
use crate::services::marks_service::MarksService;
use crate::services::session_service::{self, SessionReconstructor};
use crate::services::user_service::UserService;

/// Who is looking at the board: admins see every row, students only their own.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub username: String,
    pub is_admin: bool,
}

fn home_entry(assessment: &Assessment, events: &[Event]) -> HomeEntry {
    let answered_count = session_service::answered_count(events);
    let video_progress = session_service::video_progress(events);
    let total_videos = assessment.total_videos();
    HomeEntry {
        assessment: assessment.clone(),
        answered_count,
        video_progress,
        total_videos,
        all_done: session_service::all_done(total_videos, video_progress, answered_count),
    }
}

/// Places each entry in exactly one bucket. Finished wins over expired.
pub fn bucket_home(entries: Vec<HomeEntry>, now: DateTime<Utc>) -> HomeBuckets {
    let mut buckets = HomeBuckets::default();
    for entry in entries {
        if entry.all_done {
            buckets.finished.push(entry);
        } else if entry.assessment.is_expired(now) {
            buckets.expired.push(entry);
        } else {
            buckets.upcoming.push(entry);
        }
    }
    buckets.upcoming.sort_by(|a, b| {
        match (a.assessment.deadline_at(), b.assessment.deadline_at()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    buckets.completed_count = buckets.finished.len();
    buckets
}

/// `None` when the student has not answered anything yet.
pub fn board_row(
    user: &User,
    mut events: Vec<Event>,
    assessment: &Assessment,
    marks: &MarksSheet,
) -> Option<BoardRow> {
    sort_chronologically(&mut events);
    let text_count = events
        .iter()
        .filter(|e| matches!(e, Event::Text { .. }))
        .count();
    let voice_count = events
        .iter()
        .filter(|e| matches!(e, Event::Voice { .. }))
        .count();
    let response_count = text_count + voice_count;
    if response_count == 0 {
        return None;
    }

    let last_activity = events
        .iter()
        .filter(|e| e.is_answer())
        .map(Event::timestamp)
        .max()
        .unwrap_or(0);
    let view = SessionReconstructor::view(&events, assessment);
    let all_done = view.progress.all_done;
    let username = user.username();

    Some(BoardRow {
        marks: marks.get(&username).copied().flatten(),
        username,
        email: user.email.clone(),
        name: user.display_name(),
        groups: view.groups,
        video_progress: view.progress.video_progress,
        progress: view.progress,
        messages: events,
        response_count,
        text_count,
        voice_count,
        last_activity,
        status: if all_done {
            BoardStatus::Completed
        } else {
            BoardStatus::InProgress
        },
        all_done,
    })
}

#[derive(Clone)]
pub struct ProgressService {
    assessments: AssessmentService,
    events: EventService,
    marks: MarksService,
    users: UserService,
}

impl ProgressService {
    pub fn new(
        assessments: AssessmentService,
        events: EventService,
        marks: MarksService,
        users: UserService,
    ) -> Self {
        Self {
            assessments,
            events,
            marks,
            users,
        }
    }

    pub async fn status_for_user(&self, username: &str) -> Result<StatusForUser> {
        let mut status = StatusForUser::default();
        for assessment in self.assessments.list().await? {
            status
                .total_videos
                .insert(assessment.id.clone(), assessment.total_videos());

            let events = self.events.list(&assessment.id, username).await?;
            let answered = session_service::answered_count(&events);
            if answered > 0 {
                status.answered.insert(assessment.id.clone(), answered);
            }
            if events
                .iter()
                .any(|e| matches!(e, Event::VideoProgress { .. }))
            {
                status.video_progress.insert(
                    assessment.id.clone(),
                    session_service::video_progress(&events),
                );
            }
        }
        Ok(status)
    }

    pub async fn home_for_user(&self, username: &str, now: DateTime<Utc>) -> Result<HomeBuckets> {
        let mut entries = Vec::new();
        for assessment in self.assessments.list().await? {
            let events = self.events.list(&assessment.id, username).await?;
            entries.push(home_entry(&assessment, &events));
        }
        Ok(bucket_home(entries, now))
    }

    pub async fn board(&self, assessment: &Assessment, viewer: &Viewer) -> Result<ResponseBoard> {
        let marks = self.marks.sheet(&assessment.id).await?;
        let users = self.users.load().await?;

        let mut students = Vec::new();
        for user in users.students() {
            let username = user.username();
            if !viewer.is_admin && username != viewer.username {
                continue;
            }
            let events = self.events.list(&assessment.id, &username).await?;
            if let Some(row) = board_row(user, events, assessment, &marks) {
                students.push(row);
            }
        }
        students.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

        Ok(ResponseBoard {
            total: students.len(),
            students,
            full_marks: assessment.full_marks,
            total_videos: assessment.total_videos(),
            assessment_videos: assessment.videos.clone(),
        })
    }
}
