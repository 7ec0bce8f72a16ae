//! In-process mapping store backed by a moka cache.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::{MappingStore, StoreError};

/// Mapping store living in process memory.
///
/// Bounded by entry count; entries optionally expire after a fixed TTL.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, String>,
}

impl MemoryStore {
    /// Create a store holding at most `max_entries` mappings.
    #[must_use]
    pub fn new(max_entries: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_entries);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(100_000, None)
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).await)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
