//! Cache trait for expiring key-value storage

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Expiring key-value cache.
///
/// Implementations report transport failures as `CacheUnavailable`; callers
/// decide whether that is fatal.
#[async_trait]
pub trait CachePort: Send + Sync {
    /// Returns `None` for absent or expired keys.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
