//! Single-limit sliding window limiter.

use std::sync::Arc;
use std::time::Duration;

use super::store::RateLimitStore;
use crate::error::AppError;

/// Enforces one limit over one window for each key.
///
/// The policy limiter composes many of these checks; this standalone form
/// remains useful where a single flat limit is enough.
pub struct SlidingWindowLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: i64,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: i64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// Records a hit and reports whether the key is still under its limit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the counter store fails.
    pub async fn allow(&self, key: &str) -> Result<bool, AppError> {
        let count = self.store.record(key, self.window).await?;

        Ok(count <= self.limit)
    }
}
