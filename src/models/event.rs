use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::lenient::{
    loose_count, loose_optional_int, null_as_default, parse_leading_int,
};

/// One entry of a student's per-assessment log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    VideoShown {
        #[serde(
            rename = "videoIndex",
            default,
            deserialize_with = "loose_optional_int",
            skip_serializing_if = "Option::is_none"
        )]
        video_index: Option<i64>,
        /// Older clients put the index here instead of `videoIndex`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default)]
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<String>,
    },
    VideoProgress {
        #[serde(rename = "videoCount", default, deserialize_with = "loose_count")]
        video_count: usize,
        #[serde(default)]
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<String>,
    },
    Text {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(default)]
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<String>,
    },
    Voice {
        #[serde(default, deserialize_with = "null_as_default")]
        url: String,
        #[serde(rename = "publicId", default, skip_serializing_if = "Option::is_none")]
        public_id: Option<String>,
        #[serde(default)]
        transcript: Option<String>,
        #[serde(default = "default_voice_format")]
        format: String,
        #[serde(default)]
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

fn default_voice_format() -> String {
    "webm".to_string()
}

fn created_at(timestamp: i64) -> Option<String> {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

impl Event {
    pub fn video_shown(video_index: usize, timestamp: i64) -> Self {
        Event::VideoShown {
            video_index: Some(video_index as i64),
            text: None,
            timestamp,
            created: created_at(timestamp),
        }
    }

    pub fn video_progress(video_count: usize, timestamp: i64) -> Self {
        Event::VideoProgress {
            video_count,
            timestamp,
            created: created_at(timestamp),
        }
    }

    pub fn text(text: impl Into<String>, timestamp: i64) -> Self {
        Event::Text {
            text: text.into(),
            timestamp,
            created: created_at(timestamp),
        }
    }

    pub fn voice(
        url: impl Into<String>,
        public_id: Option<String>,
        transcript: Option<String>,
        format: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Event::Voice {
            url: url.into(),
            public_id,
            transcript,
            format: format.into(),
            timestamp,
            created: created_at(timestamp),
        }
    }

    /// Unknown events sort first.
    pub fn timestamp(&self) -> i64 {
        match self {
            Event::VideoShown { timestamp, .. }
            | Event::VideoProgress { timestamp, .. }
            | Event::Text { timestamp, .. }
            | Event::Voice { timestamp, .. } => *timestamp,
            Event::Unknown => 0,
        }
    }

    /// Text or voice: something the student actually said.
    pub fn is_answer(&self) -> bool {
        matches!(self, Event::Text { .. } | Event::Voice { .. })
    }

    /// Index a `video_shown` marker points at: `videoIndex`, else the integer
    /// in `text`. Negative or unreadable markers point nowhere.
    pub fn shown_index(&self) -> Option<usize> {
        match self {
            Event::VideoShown {
                video_index, text, ..
            } => video_index
                .or_else(|| text.as_deref().and_then(parse_leading_int))
                .and_then(|i| usize::try_from(i).ok()),
            _ => None,
        }
    }

    /// The words of an answer, if any. Voice answers only count when transcribed.
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            Event::Text { text, .. } => Some(text.as_str()),
            Event::Voice { transcript, .. } => {
                transcript.as_deref().filter(|t| !t.trim().is_empty())
            }
            _ => None,
        }
    }
}

/// Stable sort by timestamp; equal timestamps keep insertion order.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by_key(Event::timestamp);
}
