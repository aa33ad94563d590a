//! Approval state machine.
//!
//! [`decide`] is a pure function over a task record: it never touches
//! storage and never mutates its input. The caller persists the returned
//! record through a conditional write.

use super::{ApprovalDomainError, Identity, StatusFields, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a coordinator takes on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Pass the task on to the next coordinator, or approve it outright.
    Approve,
    /// End the chain immediately.
    Decline,
}

impl ApprovalAction {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Decline => "decline",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an accepted action did to the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Authority passed to the next coordinator.
    Advanced {
        /// The new turn-holder.
        turn_holder: Identity,
    },
    /// The last coordinator approved.
    Approved,
    /// A coordinator declined.
    Declined,
}

impl TransitionOutcome {
    /// Returns `true` when the outcome resolves the task.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }
}

/// Result of an accepted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Task record with updated status fields.
    pub record: Task,
    /// Effect on the approval chain.
    pub outcome: TransitionOutcome,
}

/// Applies `action` by `actor` to `task`.
///
/// A resolved task rejects every action before the actor is considered.
/// Otherwise only the current turn-holder may act.
///
/// # Errors
///
/// Returns [`ApprovalDomainError::AlreadyResolved`] for terminal tasks and
/// [`ApprovalDomainError::NotTurnHolder`] when `actor` is not
/// `coordinators[next]`.
pub fn decide(
    task: &Task,
    actor: &Identity,
    action: ApprovalAction,
) -> Result<Decision, ApprovalDomainError> {
    if task.is_resolved() {
        return Err(ApprovalDomainError::AlreadyResolved {
            task_id: task.id(),
            status: task.status(),
        });
    }

    let turn_holder = task
        .turn_holder()
        .ok_or(ApprovalDomainError::TurnOutOfRange {
            task_id: task.id(),
            next: task.next(),
            len: task.coordinators().len(),
        })?;
    if turn_holder != actor {
        return Err(ApprovalDomainError::NotTurnHolder {
            task_id: task.id(),
            actor: actor.clone(),
            turn_holder: turn_holder.clone(),
        });
    }

    let (fields, outcome) = match action {
        ApprovalAction::Decline => (
            StatusFields {
                next: task.next(),
                status: TaskStatus::Declined,
            },
            TransitionOutcome::Declined,
        ),
        ApprovalAction::Approve => advance(task),
    };

    Ok(Decision {
        record: task.with_status_fields(fields),
        outcome,
    })
}

fn advance(task: &Task) -> (StatusFields, TransitionOutcome) {
    let following = task.next() + 1;
    match task.coordinators().get(following) {
        Some(turn_holder) => (
            StatusFields {
                next: following,
                status: TaskStatus::InProgress,
            },
            TransitionOutcome::Advanced {
                turn_holder: turn_holder.clone(),
            },
        ),
        // The final coordinator approved; `next` stays on them.
        None => (
            StatusFields {
                next: task.next(),
                status: TaskStatus::Approved,
            },
            TransitionOutcome::Approved,
        ),
    }
}
