//! Mapping stores: `public id -> file handle`.
//!
//! A store is only ever asked to `put` a fresh key once and to `get` it any
//! number of times afterwards. No transactions, no updates, no deletes;
//! expiry is whatever the backend is configured with.

mod cloudflare;
mod error;
mod memory;

use async_trait::async_trait;

pub use cloudflare::CloudflareKvStore;
pub use error::StoreError;
pub use memory::MemoryStore;

/// External key-value store holding public mappings.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Write `key -> value`. Last write wins.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the value for `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
