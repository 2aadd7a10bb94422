//! Repository trait for short URL storage.

use crate::domain::entities::ShortUrl;
use crate::error::AppError;
use async_trait::async_trait;

/// Storage interface for short URL records.
///
/// Implementations form a decorator chain: the in-memory LRU tier wraps
/// the Redis cache tier, which wraps the durable Postgres tier. Each
/// tier delegates inward on a miss and backfills itself on the way out.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - durable tier
/// - [`crate::infrastructure::cache::RedisCacheRepository`] - cache-aside tier
/// - [`crate::infrastructure::cache::LruRepository`] - bounded in-process tier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Persists a record.
    ///
    /// Saving an existing `code` is a no-op: the durable tier keeps the
    /// first writer's record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure of the durable
    /// tier. Cache-tier failures are absorbed and logged.
    async fn save(&self, short_url: &ShortUrl) -> Result<(), AppError>;

    /// Looks up a record by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Looks up a record by the fingerprint of its normalized URL.
    ///
    /// Only records written by the hash strategy are reachable this way.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError>;
}
