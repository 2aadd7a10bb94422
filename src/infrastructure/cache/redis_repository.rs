//! Redis cache-aside tier over an inner repository.

use async_trait::async_trait;
use chrono::DateTime;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// Caches short URL records in Redis in front of the durable tier.
///
/// Entities are stored as hashes under `url:{code}` with a TTL; the
/// `url_hashes` hash mirrors the fingerprint index without a TTL (a
/// fingerprint deterministically maps to a stable code, so staleness is
/// not possible).
///
/// All cache operations are fail-open: a Redis error is a miss for reads
/// and a logged soft error for writes. Only the inner repository's errors
/// propagate to callers.
pub struct RedisCacheRepository {
    inner: Box<dyn ShortUrlRepository>,
    client: ConnectionManager,
    key_prefix: String,
    hash_index_key: String,
    ttl: Duration,
}

impl RedisCacheRepository {
    pub fn new(
        inner: Box<dyn ShortUrlRepository>,
        client: ConnectionManager,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            client,
            key_prefix: "url:".to_string(),
            hash_index_key: "url_hashes".to_string(),
            ttl,
        }
    }

    fn build_key(&self, code: &str) -> String {
        format!("{}{}", self.key_prefix, code)
    }

    /// Reads an entity from the cache. Errors and partial entries count
    /// as misses.
    async fn get_cached(&self, code: &str) -> Option<ShortUrl> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        let fields: HashMap<String, String> = match conn.hgetall(&key).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(code, error = %e, "cache read failed, falling through");
                return None;
            }
        };

        if fields.is_empty() {
            debug!(code, "cache miss");
            return None;
        }

        decode_entry(&fields).or_else(|| {
            warn!(code, "cache entry malformed, falling through");
            None
        })
    }

    /// Backfills the cache with an entity and its fingerprint index entry.
    /// Failures are logged and swallowed; the TTL reconciles stale data.
    async fn cache_entry(&self, short_url: &ShortUrl) {
        let key = self.build_key(&short_url.code);
        let mut conn = self.client.clone();

        let mut pipe = redis::pipe();
        pipe.hset_multiple(
            &key,
            &[
                ("code", short_url.code.clone()),
                ("original_url", short_url.original_url.clone()),
                (
                    "url_hash",
                    short_url.url_hash.clone().unwrap_or_default(),
                ),
                (
                    "created_at",
                    short_url.created_at.timestamp_micros().to_string(),
                ),
            ],
        )
        .ignore()
        .expire(&key, self.ttl.as_secs() as i64)
        .ignore();

        if let Some(url_hash) = &short_url.url_hash {
            pipe.hset(&self.hash_index_key, url_hash, &short_url.code)
                .ignore();
        }

        if let Err(e) = pipe.query_async::<()>(&mut conn).await {
            warn!(code = %short_url.code, error = %e, "cache write failed");
        }
    }
}

fn decode_entry(fields: &HashMap<String, String>) -> Option<ShortUrl> {
    let code = fields.get("code")?.clone();
    let original_url = fields.get("original_url")?.clone();

    let url_hash = fields
        .get("url_hash")
        .filter(|h| !h.is_empty())
        .cloned();

    let created_at = fields
        .get("created_at")
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_micros)?;

    Some(ShortUrl::new(code, original_url, url_hash, created_at))
}

#[async_trait]
impl ShortUrlRepository for RedisCacheRepository {
    async fn save(&self, short_url: &ShortUrl) -> Result<(), AppError> {
        // Durable tier first; the cache is only populated on success, so a
        // reader never sees an entry the store does not have.
        self.inner.save(short_url).await?;

        self.cache_entry(short_url).await;

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrl>, AppError> {
        if let Some(cached) = self.get_cached(code).await {
            debug!(code, "cache hit");
            return Ok(Some(cached));
        }

        let found = self.inner.find_by_code(code).await?;

        if let Some(short_url) = &found {
            self.cache_entry(short_url).await;
        }

        Ok(found)
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        let mut conn = self.client.clone();

        // The fingerprint index yields a code; the entity itself may still
        // have expired, in which case we fall through to the inner tier.
        let indexed: Option<String> = match conn.hget(&self.hash_index_key, hash).await {
            Ok(code) => code,
            Err(e) => {
                warn!(hash, error = %e, "hash index read failed, falling through");
                None
            }
        };

        if let Some(code) = indexed
            && let Some(cached) = self.get_cached(&code).await
        {
            return Ok(Some(cached));
        }

        let found = self.inner.find_by_hash(hash).await?;

        if let Some(short_url) = &found {
            self.cache_entry(short_url).await;
        }

        Ok(found)
    }
}
