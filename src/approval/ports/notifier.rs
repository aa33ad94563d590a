//! Notifier port for outbound messages.

use crate::approval::domain::{Identity, Notification};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Best-effort delivery of a single notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the message could not be handed over.
    async fn send(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The delivery service refused the message.
    #[error("notification to {recipient} rejected: {reason}")]
    Rejected {
        /// Intended recipient.
        recipient: Identity,
        /// Reason reported by the delivery service.
        reason: String,
    },

    /// Transport-level failure.
    #[error("notification delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a transport error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
