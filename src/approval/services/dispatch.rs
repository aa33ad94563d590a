//! Post-commit notification delivery.
//!
//! Services enqueue notifications on a channel once a write has committed.
//! A background worker drains the channel into the [`Notifier`], so a slow
//! or failing notifier never delays or fails the action that triggered it.

use super::ErrorKind;
use crate::approval::{domain::Notification, ports::Notifier};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors raised while starting or joining the dispatch worker.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No Tokio runtime is available to host the worker.
    #[error("notification dispatch requires a running Tokio runtime")]
    NoRuntime,

    /// The worker task panicked or was aborted.
    #[error("notification dispatch worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Delivery counts reported when the worker finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Notifications the notifier accepted.
    pub delivered: usize,
    /// Notifications the notifier rejected.
    pub failed: usize,
}

/// Handle used to enqueue notifications.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<Notification>,
}

/// Background task delivering queued notifications.
#[derive(Debug)]
pub struct DispatchWorker {
    handle: JoinHandle<DispatchReport>,
}

impl NotificationDispatcher {
    /// Starts a worker on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoRuntime`] outside a Tokio runtime.
    pub fn spawn<N>(notifier: Arc<N>) -> Result<(Self, DispatchWorker), DispatchError>
    where
        N: Notifier + ?Sized + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = runtime.spawn(deliver(notifier, receiver));
        Ok((Self { sender }, DispatchWorker { handle }))
    }

    /// Queues notifications for delivery.
    ///
    /// Never blocks. If the worker has stopped the notifications are dropped
    /// and logged.
    pub fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            if let Err(mpsc::error::SendError(dropped)) = self.sender.send(notification) {
                tracing::warn!(
                    recipient = %dropped.recipient,
                    "dispatch worker stopped, notification dropped"
                );
            }
        }
    }
}

impl DispatchWorker {
    /// Waits until every dispatcher handle is dropped and the queue drains.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Worker`] when the worker task failed.
    pub async fn join(self) -> Result<DispatchReport, DispatchError> {
        Ok(self.handle.await?)
    }
}

async fn deliver<N>(
    notifier: Arc<N>,
    mut receiver: mpsc::UnboundedReceiver<Notification>,
) -> DispatchReport
where
    N: Notifier + ?Sized,
{
    let mut report = DispatchReport::default();
    while let Some(notification) = receiver.recv().await {
        match notifier.send(&notification).await {
            Ok(()) => {
                report.delivered += 1;
                tracing::debug!(recipient = %notification.recipient, "notification delivered");
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    kind = %ErrorKind::NotifierError,
                    recipient = %notification.recipient,
                    error = %err,
                    "notification delivery failed"
                );
            }
        }
    }
    report
}
