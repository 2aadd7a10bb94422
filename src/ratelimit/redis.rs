//! Redis-backed rate limit counter store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

use super::store::RateLimitStore;
use crate::error::AppError;

/// Sliding-window counters in Redis sorted sets, shared across instances.
///
/// Each key holds one sorted set whose member scores are hit timestamps in
/// milliseconds. A call removes expired members, adds the current hit, sets
/// the key's expiry to the window (so idle keys are garbage collected), and
/// reads the cardinality. All four commands run in one MULTI/EXEC batch.
pub struct RedisRateLimitStore {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisRateLimitStore {
    pub fn new(client: ConnectionManager) -> Self {
        Self {
            client,
            key_prefix: "ratelimit:".to_string(),
        }
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Members must be unique per hit, or concurrent hits in the same
    /// millisecond would collapse into one sorted set entry.
    fn unique_member(now_ms: i64) -> String {
        let mut suffix = [0u8; 4];
        getrandom::fill(&mut suffix).expect("Failed to generate random bytes");

        format!(
            "{}:{:02x}{:02x}{:02x}{:02x}",
            now_ms, suffix[0], suffix[1], suffix[2], suffix[3]
        )
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn record(&self, key: &str, window: Duration) -> Result<i64, AppError> {
        let redis_key = self.build_key(key);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let cutoff = now_ms - window.as_millis() as i64;
        let member = Self::unique_member(now_ms);

        let mut conn = self.client.clone();

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .zrembyscore(&redis_key, "-inf", format!("({}", cutoff))
            .ignore()
            .zadd(&redis_key, member, now_ms)
            .ignore()
            .expire(&redis_key, window.as_secs().max(1) as i64)
            .ignore()
            .zcard(&redis_key)
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_members_differ_within_one_millisecond() {
        let a = RedisRateLimitStore::unique_member(1_700_000_000_000);
        let b = RedisRateLimitStore::unique_member(1_700_000_000_000);

        assert_ne!(a, b);
        assert!(a.starts_with("1700000000000:"));
    }
}
