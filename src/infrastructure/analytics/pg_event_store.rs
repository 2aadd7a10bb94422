//! Time-series writer for analytics events.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::ipnetwork::IpNetwork;
use std::sync::Arc;

use super::event_store::EventStore;
use crate::domain::events::{UrlAccessedEvent, UrlCreatedEvent};
use crate::error::AppError;

/// Appends events to the two time-partitioned tables.
///
/// Tables are hypertables chunked on their time column in week-sized
/// ranges (see migrations). The writer only inserts; rows are never
/// updated or deleted here. Duplicate rows from redelivered messages are
/// acceptable for analytics. Safe for concurrent use through the pool.
pub struct PgEventStore {
    pool: Arc<PgPool>,
}

impl PgEventStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Events carry IPs as strings; anything unparseable lands as NULL rather
/// than failing the write.
fn parse_ip(raw: &str) -> Option<IpNetwork> {
    raw.parse().ok()
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn save_url_created(&self, event: &UrlCreatedEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO url_created_events
                (code, original_url, url_hash, strategy, created_at, client_ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&event.code)
        .bind(&event.original_url)
        .bind(&event.url_hash)
        .bind(&event.strategy)
        .bind(event.created_at)
        .bind(parse_ip(&event.client_ip))
        .bind(&event.user_agent)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn save_url_accessed(&self, event: &UrlAccessedEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO url_accessed_events
                (code, accessed_at, client_ip, user_agent, referrer)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&event.code)
        .bind(event.accessed_at)
        .bind(parse_ip(&event.client_ip))
        .bind(&event.user_agent)
        .bind(&event.referrer)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
