//! Error types for approval domain validation and transitions.

use super::{Identity, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning approval tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApprovalDomainError {
    /// An identity is empty after trimming.
    #[error("identity must not be empty")]
    EmptyIdentity,

    /// A task was proposed without any coordinators.
    #[error("a task requires at least one coordinator")]
    EmptyCoordinators,

    /// The task has already reached a terminal status.
    #[error("task {task_id} is already resolved ({status})")]
    AlreadyResolved {
        /// Task identifier.
        task_id: TaskId,
        /// Terminal status of the task.
        status: TaskStatus,
    },

    /// The acting identity does not hold the current turn.
    #[error("{actor} may not act on task {task_id}; awaiting {turn_holder}")]
    NotTurnHolder {
        /// Task identifier.
        task_id: TaskId,
        /// Identity that attempted the action.
        actor: Identity,
        /// Identity whose turn it is.
        turn_holder: Identity,
    },

    /// A persisted non-terminal record points past its coordinator chain.
    #[error("task {task_id} turn index {next} is outside a chain of {len} coordinators")]
    TurnOutOfRange {
        /// Task identifier.
        task_id: TaskId,
        /// Stored turn index.
        next: usize,
        /// Length of the coordinator chain.
        len: usize,
    },
}

/// Error returned while parsing task status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a task identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed task identifier: {0}")]
pub struct ParseTaskIdError(pub String);
