//! Outbound notification seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// A plain-text message addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A recipient or sender address was rejected before sending.
    #[error("Invalid address: {0}")]
    Address(String),

    /// The transport failed to deliver the message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Delivery did not finish within the allowed time.
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Sends notification messages (email or otherwise).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        (**self).send(message).await
    }
}
