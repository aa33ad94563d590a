//! Notifier that writes notifications to the tracing log.

use async_trait::async_trait;

use crate::approval::{
    domain::{Notification, NotificationKind},
    ports::{Notifier, NotifierError},
};

/// Notifier emitting one `info` event per notification.
///
/// Useful where no delivery service is wired up yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let kind = match notification.kind {
            NotificationKind::Coordination { .. } => "coordination",
            NotificationKind::Info => "info",
        };
        tracing::info!(
            recipient = %notification.recipient,
            sender = %notification.sender,
            subject = %notification.subject,
            kind,
            "{}",
            notification.body
        );
        Ok(())
    }
}
