//! Redis-backed cache

use async_trait::async_trait;
use catalog_core::{CachePort, CatalogError};
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Cache backed by a shared Redis instance.
///
/// `ConnectionManager` reconnects on its own; a failed call is reported as
/// `CacheUnavailable` and the next call tries again.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to Redis at: {}", url);
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> catalog_core::Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> catalog_core::Result<()> {
        // Redis rejects EX 0
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> catalog_core::Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_error)
    }
}

fn cache_error(e: redis::RedisError) -> CatalogError {
    CatalogError::CacheUnavailable(e.to_string())
}
