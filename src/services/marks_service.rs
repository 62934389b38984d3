use crate::database::{keys, JsonStore};
use crate::error::Result;
use crate::models::marks::MarksSheet;

#[derive(Clone)]
pub struct MarksService {
    store: JsonStore,
}

impl MarksService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    pub async fn sheet(&self, assessment_id: &str) -> Result<MarksSheet> {
        Ok(self
            .store
            .get_json::<MarksSheet>(&keys::assessment_marks(assessment_id))
            .await?
            .unwrap_or_default())
    }

    pub async fn save_sheet(&self, assessment_id: &str, sheet: &MarksSheet) -> Result<()> {
        self.store
            .set_json(&keys::assessment_marks(assessment_id), sheet)
            .await
    }

    /// `None` clears the student's mark but keeps the entry.
    pub async fn set_mark(
        &self,
        assessment_id: &str,
        username: &str,
        mark: Option<f64>,
    ) -> Result<MarksSheet> {
        let mut sheet = self.sheet(assessment_id).await?;
        sheet.insert(username.to_string(), mark);
        self.save_sheet(assessment_id, &sheet).await?;
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn set_mark_keeps_other_students() {
        let svc = MarksService::new(JsonStore::new(Arc::new(MemoryStore::default())));
        svc.set_mark("a1", "alice", Some(8.0)).await.unwrap();
        let sheet = svc.set_mark("a1", "bob", None).await.unwrap();
        assert_eq!(sheet.get("alice"), Some(&Some(8.0)));
        assert_eq!(sheet.get("bob"), Some(&None));
    }
}
