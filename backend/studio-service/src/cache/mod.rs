/// Caching layer for studio-service
///
/// This module handles:
/// - Brand caching (cache-aside on reads, key invalidation on writes)
/// - Content item caching
///
/// Entries expire after five minutes; every mutation path invalidates by
/// key, so the TTL only bounds staleness for writes that bypass the service.
use crate::error::{AppError, Result};
use crate::models::{Brand, ContentItem};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const DEFAULT_TTL_SECONDS: u64 = 300;

/// Redis-backed cache helper for studio entities
#[derive(Clone)]
pub struct StudioCache {
    conn: Arc<Mutex<ConnectionManager>>,
    ttl_seconds: u64,
}

impl StudioCache {
    /// Initialize cache from Redis client
    pub async fn new(client: redis::Client, ttl_seconds: Option<u64>) -> Result<Self> {
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to connect to Redis: {e}")))?;

        Ok(Self::with_manager(Arc::new(Mutex::new(manager)), ttl_seconds))
    }

    pub fn with_manager(
        manager: Arc<Mutex<ConnectionManager>>,
        ttl_seconds: Option<u64>,
    ) -> Self {
        Self {
            conn: manager,
            ttl_seconds: ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS),
        }
    }

    /// Cache a brand record
    pub async fn cache_brand(&self, brand: &Brand) -> Result<()> {
        self.set_json(&Self::brand_key(brand.id), brand, None).await
    }

    /// Retrieve cached brand if available
    pub async fn get_brand(&self, brand_id: Uuid) -> Result<Option<Brand>> {
        self.get_json(&Self::brand_key(brand_id)).await
    }

    /// Invalidate brand cache entry
    pub async fn invalidate_brand(&self, brand_id: Uuid) -> Result<()> {
        self.delete(&Self::brand_key(brand_id)).await
    }

    /// Cache a content item
    pub async fn cache_content(&self, content: &ContentItem) -> Result<()> {
        self.set_json(&Self::content_key(content.id), content, None)
            .await
    }

    /// Retrieve cached content item
    pub async fn get_content(&self, content_id: Uuid) -> Result<Option<ContentItem>> {
        self.get_json(&Self::content_key(content_id)).await
    }

    /// Remove content item from cache
    pub async fn invalidate_content(&self, content_id: Uuid) -> Result<()> {
        self.delete(&Self::content_key(content_id)).await
    }

    /// Store arbitrary JSON payload in Redis
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)
            .map_err(|e| AppError::CacheError(format!("Failed to serialize cache value: {e}")))?;

        let ttl = ttl.unwrap_or(self.ttl_seconds);
        // Jitter spreads expiry so keys written in the same burst do not all lapse at once.
        let jitter = (rand::random::<u32>() % 10) as f64 / 100.0;
        let final_ttl = ttl + (ttl as f64 * jitter).round() as u64;

        let mut conn = self.conn.lock().await;
        conn.set_ex(key, payload, final_ttl)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to write to cache: {e}")))
    }

    /// Retrieve JSON payload from Redis
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.lock().await;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to read from cache: {e}")))?;

        match value {
            Some(raw) => {
                let parsed = serde_json::from_str(&raw).map_err(|e| {
                    AppError::CacheError(format!("Failed to deserialize cache value: {e}"))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Delete cache key
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.del(key)
            .await
            .map(|_: usize| ())
            .map_err(|e| AppError::CacheError(format!("Failed to delete cache key: {e}")))
    }

    fn brand_key(id: Uuid) -> String {
        format!("studio:brand:{id}")
    }

    fn content_key(id: Uuid) -> String {
        format!("studio:content:{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_helpers() {
        let id = Uuid::nil();
        assert_eq!(
            StudioCache::brand_key(id),
            "studio:brand:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            StudioCache::content_key(id),
            "studio:content:00000000-0000-0000-0000-000000000000"
        );
    }
}
