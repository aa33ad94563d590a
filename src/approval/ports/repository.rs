//! Repository port for task persistence and lookup.

use crate::approval::domain::{Identity, Revision, StatusUpdate, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Implementations serialise individual single-record writes; callers get
/// lost-update protection from the revision check in
/// [`TaskRepository::update_status_fields`], not from a held lock.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task created by `initiator`, oldest first.
    ///
    /// An empty result is not an error.
    async fn find_by_initiator(&self, initiator: &Identity) -> TaskRepositoryResult<Vec<Task>>;

    /// Writes the `next` and `status` fields if the stored revision still
    /// equals `update.expected_revision`, and returns the committed record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task vanished and
    /// [`TaskRepositoryError::Conflict`] when another write got there first.
    async fn update_status_fields(
        &self,
        id: TaskId,
        update: &StatusUpdate,
    ) -> TaskRepositoryResult<Task>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when nothing was deleted.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored revision moved on since the caller read the task.
    #[error("task {task_id} was modified concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        /// Task identifier.
        task_id: TaskId,
        /// Revision the caller read.
        expected: Revision,
        /// Revision currently stored.
        actual: Revision,
    },

    /// The store rolled a write back because it could not commit in time.
    #[error("write rolled back after missing its {timeout:?} deadline")]
    DeadlineExceeded {
        /// Write budget the store was given.
        timeout: Duration,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for TaskRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
