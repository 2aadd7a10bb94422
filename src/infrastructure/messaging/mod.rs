//! Event transport over Redis Streams.
//!
//! The publisher appends JSON payloads with `XADD`; consumers read through
//! a consumer group (`XREADGROUP`), acknowledge processed messages with
//! `XACK`, and leave failures pending for redelivery. Delivery is
//! at-least-once, so downstream handlers must tolerate replays.

mod consumer;
mod group;
mod publisher;

pub use consumer::{EventHandler, Runnable, StreamConsumer};
pub use group::ConsumerGroup;
pub use publisher::{AnalyticsPublisher, EventPublisher, RedisStreamPublisher};

#[cfg(test)]
pub use publisher::MockEventPublisher;
