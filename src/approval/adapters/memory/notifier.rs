//! Notifier that records messages instead of delivering them.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::approval::{
    domain::{Identity, Notification},
    ports::{Notifier, NotifierError},
};

/// Notifier keeping every accepted notification in memory.
///
/// Recipients registered through [`RecordingNotifier::reject`] get a
/// [`NotifierError::Rejected`] instead, which lets tests exercise delivery
/// failures. A lock poisoned by a panicking holder is recovered, so a
/// registered rejection is never dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    rejected: Arc<Mutex<HashSet<Identity>>>,
}

impl RecordingNotifier {
    /// Creates a notifier with no recorded messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future send to `recipient` fail.
    pub fn reject(&self, recipient: Identity) {
        self.rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient);
    }

    /// Returns the notifications accepted so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recipients of accepted notifications, in send order.
    #[must_use]
    pub fn recipients(&self) -> Vec<Identity> {
        self.sent()
            .into_iter()
            .map(|notification| notification.recipient)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let is_rejected = self
            .rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&notification.recipient);
        if is_rejected {
            return Err(NotifierError::Rejected {
                recipient: notification.recipient.clone(),
                reason: "recipient refused by recording notifier".to_owned(),
            });
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}
