//! Typed stream consumer over Redis Streams consumer groups.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::publisher::PAYLOAD_FIELD;
use crate::error::AppError;

/// Handles one decoded event. Handlers are synchronous from the consumer's
/// point of view: the worker processes a single message at a time.
#[async_trait]
pub trait EventHandler<T>: Send + Sync {
    /// # Errors
    ///
    /// An error causes the message to stay pending for redelivery.
    async fn handle(&self, event: T) -> Result<(), AppError>;
}

/// A component with a start/shutdown lifecycle, managed by
/// [`super::ConsumerGroup`].
#[async_trait]
pub trait Runnable: Send {
    async fn start(&mut self) -> Result<(), AppError>;
    async fn shutdown(&mut self);
}

/// How long one blocking read waits before re-checking for cancellation.
const READ_BLOCK_MS: usize = 1_000;

/// Backoff after a failed read, so a dead broker is not hammered.
const READ_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Consumes one topic with a typed handler.
///
/// The worker reads one message at a time through the consumer group,
/// decodes it as `T`, and invokes the handler. Success acknowledges the
/// message; a decode or handler failure leaves it in the pending entries
/// list for redelivery. Per-topic receipt order is preserved.
pub struct StreamConsumer<T, H> {
    client: ConnectionManager,
    topic: String,
    group: String,
    consumer_name: String,
    handler: Arc<H>,
    cancel: Option<watch::Sender<bool>>,
    worker: Option<JoinHandle<()>>,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> StreamConsumer<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: EventHandler<T> + 'static,
{
    pub fn new(
        client: ConnectionManager,
        topic: impl Into<String>,
        group: impl Into<String>,
        consumer_name: impl Into<String>,
        handler: Arc<H>,
    ) -> Self {
        Self {
            client,
            topic: topic.into(),
            group: group.into(),
            consumer_name: consumer_name.into(),
            handler,
            cancel: None,
            worker: None,
            _event: PhantomData,
        }
    }

    /// Creates the consumer group on the topic, tolerating one that
    /// already exists.
    async fn ensure_group(&self) -> Result<(), AppError> {
        let mut conn = self.client.clone();

        match conn
            .xgroup_create_mkstream::<_, _, _, ()>(&self.topic, &self.group, "$")
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<T, H> Runnable for StreamConsumer<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: EventHandler<T> + 'static,
{
    async fn start(&mut self) -> Result<(), AppError> {
        self.ensure_group().await?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.cancel = Some(cancel_tx);

        let worker = Worker {
            client: self.client.clone(),
            topic: self.topic.clone(),
            group: self.group.clone(),
            consumer_name: self.consumer_name.clone(),
            handler: self.handler.clone(),
            _event: PhantomData,
        };

        self.worker = Some(tokio::spawn(worker.run(cancel_rx)));

        info!(topic = %self.topic, group = %self.group, "consumer started");

        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }

        // Waits for the in-flight message, if any, to finish.
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }

        info!(topic = %self.topic, "consumer stopped");
    }
}

struct Worker<T, H> {
    client: ConnectionManager,
    topic: String,
    group: String,
    consumer_name: String,
    handler: Arc<H>,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> Worker<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: EventHandler<T> + 'static,
{
    async fn run(self, mut cancel: watch::Receiver<bool>) {
        let mut conn = self.client.clone();

        loop {
            if *cancel.borrow() {
                return;
            }

            let read = tokio::select! {
                _ = cancel.changed() => return,
                read = self.read_one(&mut conn) => read,
            };

            match read {
                Ok(entries) => {
                    for (id, payload) in entries {
                        self.process(&mut conn, &id, &payload).await;
                    }
                }
                Err(e) => {
                    error!(topic = %self.topic, error = %e, "stream read failed");

                    tokio::select! {
                        _ = cancel.changed() => return,
                        _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    /// Reads at most one new message for this consumer.
    async fn read_one(
        &self,
        conn: &mut ConnectionManager,
    ) -> Result<Vec<(String, Vec<u8>)>, AppError> {
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer_name)
            .count(1)
            .block(READ_BLOCK_MS);

        let reply: StreamReadReply = conn
            .xread_options(&[&self.topic], &[">"], &options)
            .await?;

        let mut entries = Vec::new();

        for key in reply.keys {
            for entry in key.ids {
                if let Some(payload) = entry.get::<Vec<u8>>(PAYLOAD_FIELD) {
                    entries.push((entry.id, payload));
                } else {
                    error!(topic = %self.topic, id = %entry.id, "message has no payload field");
                }
            }
        }

        Ok(entries)
    }

    async fn process(&self, conn: &mut ConnectionManager, id: &str, payload: &[u8]) {
        metrics::counter!("consumer_events_received_total", "topic" => self.topic.clone())
            .increment(1);

        let event: T = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                // Leave the message pending; it will be redelivered or
                // inspected via the pending entries list.
                metrics::counter!("consumer_events_failed_total", "topic" => self.topic.clone())
                    .increment(1);
                error!(
                    topic = %self.topic,
                    id,
                    error = %e,
                    "failed to decode event, leaving pending"
                );
                return;
            }
        };

        if let Err(e) = self.handler.handle(event).await {
            metrics::counter!("consumer_events_failed_total", "topic" => self.topic.clone())
                .increment(1);
            error!(
                topic = %self.topic,
                id,
                error = %e,
                "failed to handle event, leaving pending"
            );
            return;
        }

        if let Err(e) = conn
            .xack::<_, _, _, ()>(&self.topic, &self.group, &[id])
            .await
        {
            error!(topic = %self.topic, id, error = %e, "failed to ack message");
            return;
        }

        metrics::counter!("consumer_events_processed_total", "topic" => self.topic.clone())
            .increment(1);
        debug!(topic = %self.topic, id, "processed event");
    }
}
