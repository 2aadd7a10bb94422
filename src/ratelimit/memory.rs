//! In-process rate limit counter store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::store::RateLimitStore;
use crate::error::AppError;

/// Mutex-guarded map of request timestamps per key.
///
/// Timestamps older than the window are pruned on every call, so a key's
/// vector is bounded by the request rate within one window. Suitable for a
/// single instance; use [`crate::ratelimit::RedisRateLimitStore`] when
/// limits must be shared across replicas.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn record(&self, key: &str, window: Duration) -> Result<i64, AppError> {
        let now = Instant::now();
        let cutoff = now.checked_sub(window);

        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let timestamps = requests.entry(key.to_string()).or_default();

        if let Some(cutoff) = cutoff {
            timestamps.retain(|ts| *ts > cutoff);
        }

        timestamps.push(now);

        Ok(timestamps.len() as i64)
    }
}
