//! Event publishing into the durable stream.

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::events::{UrlAccessedEvent, UrlCreatedEvent};
use crate::error::AppError;

/// Appends raw payloads to a topic.
///
/// Success means the broker accepted the append; consumer durability is
/// confirmed downstream via acknowledgements, not here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Enqueues a payload under the topic.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the broker rejects the append.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AppError>;
}

/// Redis Streams publisher: each topic is a stream, each event an `XADD`.
pub struct RedisStreamPublisher {
    client: ConnectionManager,
}

impl RedisStreamPublisher {
    pub fn new(client: ConnectionManager) -> Self {
        Self { client }
    }
}

/// Stream entry field carrying the JSON-encoded event.
pub(crate) const PAYLOAD_FIELD: &str = "payload";

#[async_trait]
impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AppError> {
        let mut conn = self.client.clone();

        conn.xadd::<_, _, _, _, ()>(topic, "*", &[(PAYLOAD_FIELD, payload)])
            .await?;

        Ok(())
    }
}

/// Typed publisher for the analytics events.
///
/// Serializes each event as JSON and hands it to the underlying
/// [`EventPublisher`] under the configured topic.
pub struct AnalyticsPublisher {
    publisher: Arc<dyn EventPublisher>,
    topic_url_created: String,
    topic_url_accessed: String,
}

impl AnalyticsPublisher {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        topic_url_created: String,
        topic_url_accessed: String,
    ) -> Self {
        Self {
            publisher,
            topic_url_created,
            topic_url_accessed,
        }
    }

    /// Publishes a creation event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if serialization or the append fails.
    pub async fn publish_url_created(&self, event: &UrlCreatedEvent) -> Result<(), AppError> {
        self.publish_json(&self.topic_url_created, event).await
    }

    /// Publishes an access event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if serialization or the append fails.
    pub async fn publish_url_accessed(&self, event: &UrlAccessedEvent) -> Result<(), AppError> {
        self.publish_json(&self.topic_url_accessed, event).await
    }

    async fn publish_json<T: Serialize + Sync>(
        &self,
        topic: &str,
        event: &T,
    ) -> Result<(), AppError> {
        let payload = serde_json::to_vec(event)?;

        self.publisher.publish(topic, payload).await
    }
}
