//! In-memory cache using DashMap (stands in for Redis on a single node)

use async_trait::async_trait;
use catalog_core::CachePort;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Simple in-memory cache with TTL support
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|expires| now >= expires).unwrap_or(false)
    }
}

impl MemoryCache {
    /// Must be called from within a Tokio runtime (spawns the sweeper).
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        cache.start_cleanup_task();

        cache
    }

    /// Get a value from cache
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.data.get(key)?;
        if entry.is_expired(Instant::now()) {
            drop(entry);
            self.data.remove_if(key, |_, e| e.is_expired(Instant::now()));
            return None;
        }
        Some(entry.value.clone())
    }

    /// Set a value with TTL
    pub fn set_with_ttl(&self, key: String, value: Vec<u8>, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
    }

    /// Delete a key from cache
    pub fn delete(&self, key: &str) {
        self.data.remove(key);
    }

    fn start_cleanup_task(&self) {
        // Weak so the sweeper ends once the cache is dropped
        let data = Arc::downgrade(&self.data);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;

                let Some(data) = data.upgrade() else {
                    break;
                };
                let now = Instant::now();
                data.retain(|_, entry| !entry.is_expired(now));
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> catalog_core::Result<Option<Vec<u8>>> {
        Ok(MemoryCache::get(self, key))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> catalog_core::Result<()> {
        MemoryCache::set_with_ttl(self, key.to_string(), value, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> catalog_core::Result<()> {
        MemoryCache::delete(self, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let cache = MemoryCache::new();

        cache.set_with_ttl("key1".to_string(), vec![1, 2, 3], Duration::from_secs(60));
        assert_eq!(cache.get("key1"), Some(vec![1, 2, 3]));

        assert_eq!(cache.get("nonexistent"), None);

        cache.delete("key1");
        assert_eq!(cache.get("key1"), None);
    }

    #[tokio::test]
    async fn test_ttl() {
        let cache = MemoryCache::new();

        cache.set_with_ttl("key1".to_string(), vec![1, 2, 3], Duration::from_millis(10));
        assert_eq!(cache.get("key1"), Some(vec![1, 2, 3]));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("key1"), None);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = MemoryCache::new();

        cache.set_with_ttl("key1".to_string(), vec![1], Duration::from_millis(10));
        cache.set_with_ttl("key1".to_string(), vec![2], Duration::from_secs(60));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("key1"), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_port_roundtrip() {
        let cache = MemoryCache::new();
        let port: &dyn CachePort = &cache;

        port.set_with_ttl("books_cache", b"[]".to_vec(), Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(port.get("books_cache").await.unwrap(), Some(b"[]".to_vec()));

        port.delete("books_cache").await.unwrap();
        assert_eq!(port.get("books_cache").await.unwrap(), None);
    }
}
