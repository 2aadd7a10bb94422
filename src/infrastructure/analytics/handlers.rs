//! Bridges the stream consumer to the event store.

use async_trait::async_trait;
use std::sync::Arc;

use super::event_store::EventStore;
use crate::domain::events::{UrlAccessedEvent, UrlCreatedEvent};
use crate::error::AppError;
use crate::infrastructure::messaging::EventHandler;

/// Persists decoded analytics events.
///
/// One instance handles both event types; the consumer group wires one
/// typed consumer per topic against it.
pub struct EventStoreHandler {
    store: Arc<dyn EventStore>,
}

impl EventStoreHandler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler<UrlCreatedEvent> for EventStoreHandler {
    async fn handle(&self, event: UrlCreatedEvent) -> Result<(), AppError> {
        self.store.save_url_created(&event).await
    }
}

#[async_trait]
impl EventHandler<UrlAccessedEvent> for EventStoreHandler {
    async fn handle(&self, event: UrlAccessedEvent) -> Result<(), AppError> {
        self.store.save_url_accessed(&event).await
    }
}
