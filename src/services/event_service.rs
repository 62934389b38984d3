use crate::database::{keys, JsonStore};
use crate::error::Result;
use crate::models::event::Event;
use crate::services::session_service::merge_event;
use crate::utils::time::now_millis;

#[derive(Clone)]
pub struct EventService {
    store: JsonStore,
}

impl EventService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Raw log in storage order; an absent key reads as empty.
    pub async fn list(&self, assessment_id: &str, username: &str) -> Result<Vec<Event>> {
        let key = keys::assessment_messages(assessment_id, username);
        Ok(self.store.get_json::<Vec<Event>>(&key).await?.unwrap_or_default())
    }

    async fn write(&self, assessment_id: &str, username: &str, events: &[Event]) -> Result<()> {
        let key = keys::assessment_messages(assessment_id, username);
        self.store.set_json(&key, events).await
    }

    pub async fn append(&self, assessment_id: &str, username: &str, event: Event) -> Result<Event> {
        let mut events = self.list(assessment_id, username).await?;
        events.push(event.clone());
        self.write(assessment_id, username, &events).await?;
        Ok(event)
    }

    /// Returns `false` when a marker for this index already existed.
    pub async fn record_video_shown(
        &self,
        assessment_id: &str,
        username: &str,
        video_index: usize,
    ) -> Result<bool> {
        self.persist(
            assessment_id,
            username,
            Event::video_shown(video_index, now_millis()),
        )
        .await
    }

    pub async fn record_video_progress(
        &self,
        assessment_id: &str,
        username: &str,
        video_count: usize,
    ) -> Result<Event> {
        let marker = Event::video_progress(video_count, now_millis());
        self.persist(assessment_id, username, marker.clone()).await?;
        Ok(marker)
    }

    /// Applies one event with the log's merge rules and writes only when it changed something.
    pub async fn persist(&self, assessment_id: &str, username: &str, event: Event) -> Result<bool> {
        let mut events = self.list(assessment_id, username).await?;
        if !merge_event(&mut events, event) {
            return Ok(false);
        }
        self.write(assessment_id, username, &events).await?;
        Ok(true)
    }

    pub async fn clear(&self, assessment_id: &str, username: &str) -> Result<Vec<Event>> {
        let removed = self.list(assessment_id, username).await?;
        self.write(assessment_id, username, &[]).await?;
        Ok(removed)
    }
}
