use crate::config::Config;
use crate::database::{JsonStore, RedisStore};
use crate::error::Result;
use std::sync::Arc;

/// Opens the Redis-backed document store and checks that it answers.
pub async fn create_store(config: &Config) -> Result<JsonStore> {
    let backend = RedisStore::open(&config.redis_url)?;
    let store = JsonStore::new(Arc::new(backend));
    match store.ping().await {
        Ok(()) => tracing::info!("Connected to Redis"),
        Err(e) => tracing::warn!(error = %e, "Redis did not answer ping, continuing"),
    }
    Ok(store)
}
