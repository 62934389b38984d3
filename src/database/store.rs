use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::error::Category;
use std::sync::Arc;

/// Flat string key-value backend. Documents are read and written whole.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct JsonStore {
    backend: Arc<dyn KeyValueStore>,
}

impl JsonStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.backend.backend_tag()
    }

    /// Empty or syntactically broken JSON reads as absent. Well-formed JSON that
    /// does not fit `T` is a storage error, so callers never rewrite it from empty.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) if matches!(e.classify(), Category::Syntax | Category::Eof) => {
                tracing::warn!(key, error = %e, "discarding unparsable document");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(key, error = %e, "stored document does not match its model");
                Err(Error::Storage(format!(
                    "Stored document '{}' could not be read: {}",
                    key, e
                )))
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}
