//! Counter store trait for sliding-window rate limiting.

use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Records request hits in per-key sliding windows.
///
/// # Implementations
///
/// - [`crate::ratelimit::MemoryRateLimitStore`] - mutex-guarded in-process map
/// - [`crate::ratelimit::RedisRateLimitStore`] - sorted sets in Redis, for
///   multi-instance deployments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records a hit for `key` and returns the number of hits still inside
    /// the window, including this one. Expired hits are pruned on every
    /// call, so the returned count is always at least 1.
    ///
    /// The count may exceed any configured maximum; deciding allowance is
    /// the limiter's job.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the backing store is unreachable.
    async fn record(&self, key: &str, window: Duration) -> Result<i64, AppError>;
}
