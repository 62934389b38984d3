//! Replays a student's event log into question groups and progress.
//!
//! Everything here is pure: callers fetch the log, hand it over, and persist
//! whatever writes an [`AnswerSession`] reports back. Group order is shared by
//! the student view, the response board and the AI grader, which pairs grades
//! with groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::assessment::{Assessment, Video};
use crate::models::event::{sort_chronologically, Event};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    pub video_index: Option<usize>,
    pub question: Option<String>,
    pub correct_answer: Option<String>,
    pub label: Option<String>,
    pub answers: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub highest_video_shown: i64,
    pub current_video_index: i64,
    pub has_answered_current_video: bool,
    pub video_progress: usize,
    pub answered_count: usize,
    pub total_videos: usize,
    pub all_done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub groups: Vec<QuestionGroup>,
    pub progress: SessionProgress,
}

/// Completion predicate. Single-video (and video-less) assessments only need an answer;
/// longer ones also need the progress marker to cover every video.
pub fn all_done(total_videos: usize, video_progress: usize, answered_count: usize) -> bool {
    if total_videos <= 1 {
        answered_count > 0
    } else {
        video_progress >= total_videos && answered_count > 0
    }
}

pub fn video_label(video_index: usize, video_count: usize) -> String {
    if video_count > 1 {
        format!("Video {} of {}", video_index + 1, video_count)
    } else {
        "Assessment Video".to_string()
    }
}

/// Latest `video_progress` marker wins; 0 when none was ever written.
pub fn video_progress(events: &[Event]) -> usize {
    events
        .iter()
        .filter_map(|e| match e {
            Event::VideoProgress {
                video_count,
                timestamp,
                ..
            } => Some((*timestamp, *video_count)),
            _ => None,
        })
        .fold(None, |acc: Option<(i64, usize)>, cur| match acc {
            Some(prev) if prev.0 > cur.0 => Some(prev),
            _ => Some(cur),
        })
        .map(|(_, count)| count)
        .unwrap_or(0)
}

pub fn answered_count(events: &[Event]) -> usize {
    events.iter().filter(|e| e.is_answer()).count()
}

/// Applies one event the way the log store does: `video_shown` is kept once per
/// index, `video_progress` replaces the previous marker, everything else appends.
/// Returns `false` when the log was left unchanged.
pub fn merge_event(events: &mut Vec<Event>, event: Event) -> bool {
    match &event {
        Event::VideoShown { .. } => {
            if let Some(vi) = event.shown_index() {
                if events.iter().any(|e| e.shown_index() == Some(vi)) {
                    return false;
                }
            }
            events.push(event);
        }
        Event::VideoProgress { .. } => {
            match events
                .iter()
                .position(|e| matches!(e, Event::VideoProgress { .. }))
            {
                Some(idx) => events[idx] = event,
                None => events.push(event),
            }
        }
        _ => events.push(event),
    }
    true
}

pub struct SessionReconstructor;

impl SessionReconstructor {
    fn sorted(events: &[Event]) -> Vec<Event> {
        let mut sorted = events.to_vec();
        sort_chronologically(&mut sorted);
        sorted
    }

    pub fn groups(events: &[Event], videos: &[Video]) -> Vec<QuestionGroup> {
        let sorted = Self::sorted(events);
        let mut groups: Vec<QuestionGroup> = Vec::new();
        let mut current: Option<usize> = None;
        let mut seen: Vec<usize> = Vec::new();

        for event in sorted {
            match &event {
                Event::VideoShown { .. } => {
                    let Some(vi) = event.shown_index() else {
                        continue;
                    };
                    if seen.contains(&vi) {
                        continue;
                    }
                    seen.push(vi);
                    let video = videos.get(vi);
                    groups.push(QuestionGroup {
                        video_index: Some(vi),
                        question: video.and_then(|v| v.question_text()).map(str::to_string),
                        correct_answer: video
                            .and_then(|v| v.correct_answer_text())
                            .map(str::to_string),
                        label: Some(video_label(vi, videos.len())),
                        answers: Vec::new(),
                    });
                    current = Some(groups.len() - 1);
                }
                Event::Text { .. } | Event::Voice { .. } => {
                    let idx = match current {
                        Some(idx) => idx,
                        None => {
                            let first = videos.first();
                            groups.push(QuestionGroup {
                                video_index: first.map(|_| 0),
                                question: first.and_then(|v| v.question_text()).map(str::to_string),
                                correct_answer: first
                                    .and_then(|v| v.correct_answer_text())
                                    .map(str::to_string),
                                label: first.map(|_| "Assessment Video".to_string()),
                                answers: Vec::new(),
                            });
                            current = Some(groups.len() - 1);
                            groups.len() - 1
                        }
                    };
                    groups[idx].answers.push(event);
                }
                Event::VideoProgress { .. } | Event::Unknown => {}
            }
        }

        groups
    }

    pub fn progress(events: &[Event], videos: &[Video], total_videos: usize) -> SessionProgress {
        let sorted = Self::sorted(events);

        let highest_video_shown = sorted
            .iter()
            .filter_map(Event::shown_index)
            .map(|i| i as i64)
            .max()
            .unwrap_or(-1);

        let has_answered_current_video = if videos.is_empty() {
            sorted.iter().any(Event::is_answer)
        } else {
            let after_last_marker = sorted
                .iter()
                .rposition(|e| e.shown_index().is_some())
                .map(|pos| pos + 1)
                .unwrap_or(0);
            sorted[after_last_marker..].iter().any(Event::is_answer)
        };

        let current_video_index = if highest_video_shown >= 0 {
            highest_video_shown
        } else if !videos.is_empty() {
            0
        } else {
            -1
        };

        let video_progress = video_progress(&sorted);
        let answered_count = answered_count(&sorted);

        SessionProgress {
            highest_video_shown,
            current_video_index,
            has_answered_current_video,
            video_progress,
            answered_count,
            total_videos,
            all_done: all_done(total_videos, video_progress, answered_count),
        }
    }

    pub fn view(events: &[Event], assessment: &Assessment) -> SessionView {
        SessionView {
            groups: Self::groups(events, &assessment.videos),
            progress: Self::progress(events, &assessment.videos, assessment.total_videos()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceBlocked {
    #[error("This assessment is closed (deadline passed)")]
    Closed,
    #[error("Answer the current video before moving on")]
    Unanswered,
    #[error("There is no next video")]
    NoNextVideo,
}

/// One student's in-progress answer session.
///
/// Holds what the chat view used to keep in page-level globals: the assessment,
/// the known log, and from those the current video and answered flag. Every
/// mutating call applies its writes in memory first and hands them back for the
/// caller to persist, so a failed write never changes what the student sees.
#[derive(Debug, Clone)]
pub struct AnswerSession<'a> {
    assessment: &'a Assessment,
    events: Vec<Event>,
}

impl<'a> AnswerSession<'a> {
    pub fn new(assessment: &'a Assessment, mut events: Vec<Event>) -> Self {
        sort_chronologically(&mut events);
        Self { assessment, events }
    }

    fn apply(&mut self, writes: Vec<Event>) -> Vec<Event> {
        writes
            .into_iter()
            .filter(|e| merge_event(&mut self.events, e.clone()))
            .collect()
    }

    /// First render. With no `video_shown` markers yet, a legacy progress count
    /// N re-shows videos `0..N`; otherwise the first video is shown and progress
    /// starts at 1. Returns the markers to persist; empty on later opens.
    pub fn open(&mut self, now_millis: i64) -> Vec<Event> {
        let video_count = self.assessment.videos.len();
        if video_count == 0 || self.events.iter().any(|e| e.shown_index().is_some()) {
            return Vec::new();
        }

        let show_up_to = video_progress(&self.events).min(video_count);
        let writes = if show_up_to == 0 {
            vec![
                Event::video_shown(0, now_millis),
                Event::video_progress(1, now_millis),
            ]
        } else {
            (0..show_up_to)
                .map(|i| Event::video_shown(i, now_millis))
                .collect()
        };
        self.apply(writes)
    }

    pub fn record_answer(&mut self, answer: Event) {
        if answer.is_answer() {
            self.events.push(answer);
        }
    }

    pub fn progress(&self) -> SessionProgress {
        SessionReconstructor::progress(
            &self.events,
            &self.assessment.videos,
            self.assessment.total_videos(),
        )
    }

    pub fn view(&self) -> SessionView {
        SessionReconstructor::view(&self.events, self.assessment)
    }

    /// Index of the video `advance` would show next.
    pub fn can_advance(&self, now: DateTime<Utc>) -> Result<usize, AdvanceBlocked> {
        if self.assessment.is_expired(now) {
            return Err(AdvanceBlocked::Closed);
        }
        let progress = self.progress();
        if !progress.has_answered_current_video {
            return Err(AdvanceBlocked::Unanswered);
        }
        let next = (progress.current_video_index + 1).max(0) as usize;
        if next >= self.assessment.videos.len() {
            return Err(AdvanceBlocked::NoNextVideo);
        }
        Ok(next)
    }

    /// Moves to the next video: progress marker first, then the `video_shown` marker.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        now_millis: i64,
    ) -> Result<Vec<Event>, AdvanceBlocked> {
        let next = self.can_advance(now)?;
        Ok(self.apply(vec![
            Event::video_progress(next + 1, now_millis),
            Event::video_shown(next, now_millis),
        ]))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assessment(videos: usize) -> Assessment {
        let videos: Vec<_> = (0..videos)
            .map(|i| {
                json!({
                    "publicId": format!("v{}", i),
                    "url": format!("https://cdn/v{}.mp4", i),
                    "question": format!("Question about clip {}", i + 1),
                    "correctAnswer": format!("Key point {}", i + 1)
                })
            })
            .collect();
        serde_json::from_value(json!({
            "id": "a1",
            "name": "Wound care",
            "videos": videos
        }))
        .unwrap()
    }

    fn voice(transcript: &str, ts: i64) -> Event {
        Event::voice(
            "https://cdn/r.webm",
            Some("rec".into()),
            Some(transcript.into()),
            "webm",
            ts,
        )
    }

    #[test]
    fn empty_log_has_no_groups() {
        let a = assessment(2);
        let view = SessionReconstructor::view(&[], &a);
        assert!(view.groups.is_empty());
        assert_eq!(view.progress.current_video_index, 0);
        assert_eq!(view.progress.highest_video_shown, -1);
        assert!(!view.progress.has_answered_current_video);

        let none = assessment(0);
        assert_eq!(
            SessionReconstructor::progress(&[], &none.videos, 0).current_video_index,
            -1
        );
    }

    #[test]
    fn answers_attach_to_the_preceding_video() {
        let a = assessment(2);
        let events = vec![
            Event::video_shown(0, 1),
            Event::text("first", 2),
            Event::video_progress(2, 3),
            Event::video_shown(1, 4),
            voice("second", 5),
        ];
        let groups = SessionReconstructor::groups(&events, &a.videos);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].video_index, Some(0));
        assert_eq!(groups[0].label.as_deref(), Some("Video 1 of 2"));
        assert_eq!(groups[0].question.as_deref(), Some("Question about clip 1"));
        assert_eq!(groups[1].correct_answer.as_deref(), Some("Key point 2"));
        assert_eq!(groups[0].answers.len(), 1);
        assert_eq!(groups[1].answers.len(), 1);
    }

    #[test]
    fn storage_order_does_not_matter() {
        let a = assessment(3);
        let events = vec![
            Event::video_shown(0, 10),
            Event::text("a", 11),
            Event::video_shown(1, 20),
            Event::text("b", 21),
            Event::text("c", 22),
        ];
        let mut shuffled = events.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);
        assert_eq!(
            SessionReconstructor::view(&events, &a),
            SessionReconstructor::view(&shuffled, &a)
        );
    }

    #[test]
    fn duplicate_video_shown_is_idempotent() {
        let a = assessment(2);
        let base = vec![
            Event::video_shown(0, 1),
            Event::text("a", 2),
            Event::video_shown(1, 3),
            Event::text("b", 4),
        ];
        let mut dup = base.clone();
        dup.push(Event::video_shown(1, 5));
        dup.push(Event::video_shown(0, 6));
        assert_eq!(
            SessionReconstructor::groups(&base, &a.videos),
            SessionReconstructor::groups(&dup, &a.videos)
        );
    }

    #[test]
    fn group_count_is_distinct_markers_plus_one_default() {
        let a = assessment(2);
        let events = vec![
            Event::text("legacy", 1),
            Event::video_shown(1, 2),
            Event::video_shown(1, 3),
            Event::text("x", 4),
        ];
        let groups = SessionReconstructor::groups(&events, &a.videos);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].video_index, Some(0));
        assert_eq!(groups[0].label.as_deref(), Some("Assessment Video"));
    }

    #[test]
    fn out_of_range_marker_still_opens_a_group() {
        let a = assessment(1);
        let events = vec![Event::video_shown(7, 1), Event::text("x", 2)];
        let groups = SessionReconstructor::groups(&events, &a.videos);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].video_index, Some(7));
        assert!(groups[0].question.is_none());
        assert!(groups[0].correct_answer.is_none());
    }

    #[test]
    fn video_less_assessment_default_group() {
        let a = assessment(0);
        let events = vec![Event::text("only answer", 1)];
        let view = SessionReconstructor::view(&events, &a);
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].video_index, None);
        assert_eq!(view.groups[0].label, None);
        assert!(view.progress.has_answered_current_video);
        assert!(view.progress.all_done);
    }

    #[test]
    fn answered_flag_looks_after_last_marker() {
        let a = assessment(2);
        let events = vec![
            Event::video_shown(0, 1),
            Event::text("a", 2),
            Event::video_shown(1, 3),
        ];
        let progress = SessionReconstructor::progress(&events, &a.videos, 2);
        assert_eq!(progress.current_video_index, 1);
        assert!(!progress.has_answered_current_video);
    }

    #[test]
    fn completion_rule() {
        assert!(all_done(1, 0, 1));
        assert!(!all_done(1, 5, 0));
        assert!(all_done(0, 0, 2));
        assert!(all_done(3, 3, 1));
        assert!(!all_done(3, 2, 5));
        assert!(!all_done(3, 3, 0));
    }

    #[test]
    fn completion_trusts_progress_marker_not_shown_videos() {
        let a = assessment(2);
        let events = vec![
            Event::video_shown(0, 1),
            Event::video_shown(1, 2),
            Event::text("a", 3),
        ];
        let progress = SessionReconstructor::progress(&events, &a.videos, 2);
        assert_eq!(progress.highest_video_shown, 1);
        assert!(!progress.all_done);
    }

    #[test]
    fn merge_event_dedupes_and_upserts() {
        let mut log = Vec::new();
        assert!(merge_event(&mut log, Event::video_shown(0, 1)));
        assert!(!merge_event(&mut log, Event::video_shown(0, 2)));
        assert!(merge_event(&mut log, Event::video_progress(1, 3)));
        assert!(merge_event(&mut log, Event::video_progress(2, 4)));
        assert_eq!(log.len(), 2);
        assert_eq!(video_progress(&log), 2);
    }

    #[test]
    fn two_video_walkthrough() {
        let a = assessment(2);
        let mut session = AnswerSession::new(&a, Vec::new());

        let writes = session.open(100);
        assert_eq!(
            writes,
            vec![Event::video_shown(0, 100), Event::video_progress(1, 100)]
        );
        assert_eq!(session.progress().current_video_index, 0);
        assert!(session.open(101).is_empty());

        let now = Utc::now();
        assert_eq!(session.advance(now, 150), Err(AdvanceBlocked::Unanswered));

        session.record_answer(Event::text("answer1", 200));
        assert!(session.progress().has_answered_current_video);

        let writes = session.advance(now, 300).unwrap();
        assert_eq!(writes.len(), 2);
        let progress = session.progress();
        assert_eq!(progress.current_video_index, 1);
        assert!(!progress.has_answered_current_video);
        assert_eq!(progress.video_progress, 2);

        session.record_answer(voice("answer2", 400));
        let view = session.view();
        assert_eq!(view.groups.len(), 2);
        assert!(view.groups.iter().all(|g| g.answers.len() == 1));
        assert!(view.progress.all_done);
        assert_eq!(session.can_advance(now), Err(AdvanceBlocked::NoNextVideo));
    }

    #[test]
    fn legacy_progress_reshows_reached_videos() {
        let a = assessment(3);
        let mut session = AnswerSession::new(&a, vec![Event::video_progress(2, 5)]);
        let writes = session.open(10);
        assert_eq!(
            writes,
            vec![Event::video_shown(0, 10), Event::video_shown(1, 10)]
        );
        assert_eq!(session.progress().current_video_index, 1);
    }

    #[test]
    fn expired_assessment_cannot_advance() {
        let mut a = assessment(2);
        a.deadline = Some("2024-01-01T00:00:00Z".into());
        let session = AnswerSession::new(
            &a,
            vec![Event::video_shown(0, 1), Event::text("a", 2)],
        );
        assert_eq!(session.can_advance(Utc::now()), Err(AdvanceBlocked::Closed));
    }
}
