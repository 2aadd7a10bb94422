//! Store trait for persisting analytics events.

use async_trait::async_trait;

use crate::domain::events::{UrlAccessedEvent, UrlCreatedEvent};
use crate::error::AppError;

/// Append-only sink for analytics events.
///
/// Delivery upstream is at-least-once, so implementations must tolerate
/// the same event being written more than once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    async fn save_url_created(&self, event: &UrlCreatedEvent) -> Result<(), AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure.
    async fn save_url_accessed(&self, event: &UrlAccessedEvent) -> Result<(), AppError>;
}
