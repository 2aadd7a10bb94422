//! Dependency health checks.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

/// Pings a dependency to report liveness.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Returns `true` when the dependency answers.
    async fn ping(&self) -> bool;
}

/// Redis connectivity check via `PING`.
pub struct RedisHealthChecker {
    client: ConnectionManager,
}

impl RedisHealthChecker {
    pub fn new(client: ConnectionManager) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthChecker for RedisHealthChecker {
    async fn ping(&self) -> bool {
        let mut conn = self.client.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
