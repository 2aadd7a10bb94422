//! Unified lifecycle for a set of consumers.

use serde_json::json;
use tracing::info;

use super::consumer::Runnable;
use crate::error::AppError;

/// Manages multiple consumers as one unit.
///
/// `start` brings consumers up in registration order; if any fails, the
/// ones already running are shut down in reverse order and the error is
/// returned. `shutdown` stops every consumer, waiting for each worker's
/// in-flight message.
#[derive(Default)]
pub struct ConsumerGroup {
    consumers: Vec<Box<dyn Runnable>>,
}

impl ConsumerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a consumer with the group.
    pub fn add(&mut self, consumer: Box<dyn Runnable>) {
        self.consumers.push(consumer);
    }

    /// Starts all consumers.
    ///
    /// # Errors
    ///
    /// Returns the first start failure after rolling back consumers that
    /// had already started.
    pub async fn start(&mut self) -> Result<(), AppError> {
        for index in 0..self.consumers.len() {
            if let Err(e) = self.consumers[index].start().await {
                for started in self.consumers[..index].iter_mut().rev() {
                    started.shutdown().await;
                }

                return Err(AppError::internal(
                    format!("failed to start consumer {index}"),
                    json!({ "reason": e.to_string() }),
                ));
            }
        }

        info!(count = self.consumers.len(), "consumer group started");

        Ok(())
    }

    /// Stops all consumers gracefully.
    pub async fn shutdown(&mut self) {
        info!("shutting down consumer group");

        for consumer in &mut self.consumers {
            consumer.shutdown().await;
        }
    }
}
