//! Service-level error taxonomy.

use crate::approval::{
    domain::{ApprovalDomainError, Identity, TaskId},
    ports::{AuthenticationError, TaskRepositoryError},
};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Caller-facing classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request or empty coordinator list.
    InvalidInput,
    /// The task does not exist or its identifier is malformed.
    NotFound,
    /// The verified identity may not perform the action.
    NotAuthorized,
    /// The credentials could not be verified.
    Unauthenticated,
    /// The task is already approved or declined.
    AlreadyResolved,
    /// A concurrent transition won; the caller may retry.
    Conflict,
    /// The store failed or timed out.
    StoreError,
    /// The notifier failed. Logged, never returned from an action.
    NotifierError,
}

impl ErrorKind {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::NotAuthorized => "not_authorized",
            Self::Unauthenticated => "unauthenticated",
            Self::AlreadyResolved => "already_resolved",
            Self::Conflict => "conflict",
            Self::StoreError => "store_error",
            Self::NotifierError => "notifier_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure payload for transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Service-level errors for approval operations.
#[derive(Debug, Error)]
pub enum ApprovalServiceError {
    /// Domain validation or transition rules rejected the request.
    #[error(transparent)]
    Domain(#[from] ApprovalDomainError),

    /// No task matches the supplied identifier.
    #[error("task {0} not found")]
    TaskNotFound(String),

    /// Only the initiator may delete a task.
    #[error("{actor} did not initiate task {task_id}")]
    NotInitiator {
        /// Task identifier.
        task_id: TaskId,
        /// Identity that attempted the deletion.
        actor: Identity,
    },

    /// The coordinator named in the request is not the verified identity.
    #[error("request names coordinator '{claimed}' but the session belongs to {actor}")]
    CoordinatorMismatch {
        /// Coordinator named by the request.
        claimed: String,
        /// Verified identity.
        actor: Identity,
    },

    /// Another transition committed between our read and our write.
    #[error("task {0} was modified concurrently, retry the request")]
    Conflict(TaskId),

    /// A store call did not complete in time.
    #[error("store operation {operation} timed out after {timeout:?}")]
    StoreTimeout {
        /// Store operation name.
        operation: &'static str,
        /// Configured bound.
        timeout: Duration,
    },

    /// Store failure.
    #[error(transparent)]
    Repository(TaskRepositoryError),

    /// Credential verification failed.
    #[error(transparent)]
    Unauthenticated(#[from] AuthenticationError),
}

impl From<TaskRepositoryError> for ApprovalServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id.to_string()),
            TaskRepositoryError::Conflict { task_id, .. } => Self::Conflict(task_id),
            other => Self::Repository(other),
        }
    }
}

impl ApprovalServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(
                ApprovalDomainError::EmptyIdentity | ApprovalDomainError::EmptyCoordinators,
            ) => ErrorKind::InvalidInput,
            Self::Domain(ApprovalDomainError::AlreadyResolved { .. }) => {
                ErrorKind::AlreadyResolved
            }
            Self::Domain(ApprovalDomainError::NotTurnHolder { .. })
            | Self::NotInitiator { .. }
            | Self::CoordinatorMismatch { .. } => ErrorKind::NotAuthorized,
            Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Domain(ApprovalDomainError::TurnOutOfRange { .. })
            | Self::StoreTimeout { .. }
            | Self::Repository(_) => ErrorKind::StoreError,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
        }
    }

    /// Returns the structured payload for this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Result type for approval service operations.
pub type ApprovalServiceResult<T> = Result<T, ApprovalServiceError>;
