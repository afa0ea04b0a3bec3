// =============================================================================
// CACHE MODULE
// =============================================================================
// Optional Redis read-through cache for product details and facet lists.
//
// LEARNING NOTES:
// - ConnectionManager reconnects on its own; cloning it is cheap
// - Cache failures never fail a request: a broken cache just means a miss
// - Values are stored as JSON strings with a TTL (SETEX)
// =============================================================================

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::metrics;

/// Key for the distinct category list
pub const CATEGORIES_KEY: &str = "catalog:categories";

/// Key for the distinct brand list
pub const BRANDS_KEY: &str = "catalog:brands";

/// Key for a single product detail
pub fn product_key(id: Uuid) -> String {
    format!("catalog:product:{id}")
}

#[derive(Clone)]
pub struct ProductCache {
    /// `None` when no REDIS_URL is configured
    conn: Option<ConnectionManager>,
    ttl: Duration,
}

impl ProductCache {
    /// Connect to Redis if a URL is given, otherwise return a disabled cache
    pub async fn connect(redis_url: Option<&str>, ttl: Duration) -> Result<Self> {
        let conn = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
                let manager = ConnectionManager::new(client)
                    .await
                    .context("Failed to connect to Redis")?;
                Some(manager)
            }
            None => None,
        };

        Ok(Self { conn, ttl })
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            conn: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some() && !self.ttl.is_zero()
    }

    /// Fetch and decode a cached value. Errors count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let mut conn = self.conn.clone()?;

        let start = Instant::now();
        let cached: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| tracing::warn!(key, error = %e, "Cache read failed"))
            .ok()
            .flatten();
        metrics::record_redis_operation("get", start.elapsed().as_secs_f64());

        let value = cached.and_then(|json| serde_json::from_str::<T>(&json).ok());
        metrics::record_cache_lookup(value.is_some());
        value
    }

    /// Store a value with the configured TTL. Errors are logged and dropped.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        if !self.is_enabled() {
            return;
        }
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let start = Instant::now();
        let result: redis::RedisResult<()> = redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl.as_secs().max(1))
            .arg(json)
            .query_async(&mut conn)
            .await;
        metrics::record_redis_operation("set", start.elapsed().as_secs_f64());

        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }

    /// `None` when disabled, otherwise whether Redis answered PING
    pub async fn ping(&self) -> Option<bool> {
        let mut conn = self.conn.clone()?;
        let ok = redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok();
        Some(ok)
    }
}
