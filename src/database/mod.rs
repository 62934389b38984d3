pub mod keys;
pub mod memory;
pub mod pool;
pub mod redis_store;
pub mod store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{JsonStore, KeyValueStore};
