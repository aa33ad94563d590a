//! Outbound notification values.
//!
//! Field names are the contract notifier templates key off, so they are
//! serialised verbatim.

use super::Identity;
use serde::{Deserialize, Serialize};

/// Kind of outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Asks the recipient to approve or decline a task.
    Coordination {
        /// Link that approves the task on behalf of the recipient.
        accept_link: String,
        /// Link that declines the task on behalf of the recipient.
        decline_link: String,
    },
    /// Informs the recipient about a resolution.
    Info,
}

/// Templated message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identity receiving the message.
    pub recipient: Identity,
    /// Identity on whose behalf the message is sent.
    pub sender: Identity,
    /// Message subject; the task description.
    pub subject: String,
    /// Message kind and kind-specific payload.
    #[serde(flatten)]
    pub kind: NotificationKind,
    /// Rendered message body.
    pub body: String,
}
