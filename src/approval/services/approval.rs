//! Service layer orchestrating task creation, approval, and deletion.

use super::{
    ApprovalServiceError, ApprovalServiceResult, NotificationDispatcher, NotificationRenderError,
    NotificationTrigger,
};
use crate::approval::{
    domain::{
        ApprovalAction, ApprovalDomainError, CoordinatorChain, Identity, Notification, Principal,
        StatusUpdate, Task, TaskId, TaskProposal, TaskStatus, TransitionOutcome, decide,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::config::{ApprovalConfig, DeletePolicy};
use mockable::Clock;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Request payload for proposing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTaskRequest {
    name: String,
    description: String,
    coordinators: Vec<String>,
}

impl AddTaskRequest {
    /// Creates a request with the task name and coordinators in turn order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, coordinators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            coordinators: coordinators.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Request payload for an approve or decline action.
///
/// Both fields arrive as raw path segments and are validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorActionRequest {
    task_id: String,
    coordinator: String,
}

impl CoordinatorActionRequest {
    /// Creates a request naming the task and the acting coordinator.
    #[must_use]
    pub fn new(task_id: impl Into<String>, coordinator: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            coordinator: coordinator.into(),
        }
    }
}

/// Result of an accepted approve or decline action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The approval passed the task to the next coordinator.
    Advanced {
        /// Committed task record.
        task: Task,
        /// Coordinator whose turn it now is.
        turn_holder: Identity,
    },
    /// The final coordinator approved.
    Approved {
        /// Committed task record.
        task: Task,
    },
    /// The coordinator declined.
    Declined {
        /// Committed task record.
        task: Task,
    },
}

impl ApprovalOutcome {
    /// Returns the committed task record.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Advanced { task, .. } | Self::Approved { task } | Self::Declined { task } => {
                task
            }
        }
    }

    /// Returns the confirmation shown to the acting coordinator.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Advanced { turn_holder, .. } => {
                format!("you have approved this task: next coordinator: {turn_holder}")
            }
            Self::Approved { .. } => "coordination end: approved".to_owned(),
            Self::Declined { .. } => "you have declined this task".to_owned(),
        }
    }
}

/// Confirmation of a deleted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionReceipt {
    /// Identifier of the deleted task.
    pub task_id: TaskId,
}

impl DeletionReceipt {
    /// Returns the confirmation shown to the initiator.
    #[must_use]
    pub fn message(&self) -> String {
        format!("successfully deleted task {}", self.task_id)
    }
}

/// Caller-facing projection of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Task identifier.
    pub id: TaskId,
    /// Identity that created the task.
    pub initiator: Identity,
    /// Task name.
    pub name: String,
    /// Task description.
    pub description: String,
    /// Coordinators in turn order.
    pub coordinators: Vec<Identity>,
    /// Approval status.
    pub status: TaskStatus,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            initiator: task.initiator().clone(),
            name: task.name().to_owned(),
            description: task.description().to_owned(),
            coordinators: task.coordinators().as_slice().to_vec(),
            status: task.status(),
        }
    }
}

/// Sequential approval orchestration service.
///
/// Every operation re-reads the task from the store. State changes go
/// through a single conditional write; notifications are queued only after
/// that write commits.
#[derive(Clone)]
pub struct ApprovalService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: Arc<ApprovalConfig>,
    trigger: NotificationTrigger,
    dispatcher: NotificationDispatcher,
}

impl<R, C> ApprovalService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new approval service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        clock: Arc<C>,
        config: Arc<ApprovalConfig>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let trigger = NotificationTrigger::new(config.notifications, &*config.action_link_base);
        Self {
            repository,
            clock,
            config,
            trigger,
            dispatcher,
        }
    }

    /// Lists the tasks created by `principal`.
    ///
    /// An empty list is a successful result.
    ///
    /// # Errors
    ///
    /// Returns a store error when the lookup fails or times out.
    pub async fn list_tasks(&self, principal: &Principal) -> ApprovalServiceResult<Vec<Task>> {
        self.bounded(
            "find_by_initiator",
            self.repository.find_by_initiator(principal.identity()),
        )
        .await
    }

    /// Creates a task on behalf of `principal` and asks the first
    /// coordinator to act.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalDomainError::EmptyCoordinators`] or
    /// [`ApprovalDomainError::EmptyIdentity`] for invalid coordinator lists,
    /// and a store error when persistence fails.
    pub async fn add_task(
        &self,
        principal: &Principal,
        request: AddTaskRequest,
    ) -> ApprovalServiceResult<Task> {
        let coordinators = CoordinatorChain::parse(request.coordinators).inspect_err(|err| {
            tracing::debug!(initiator = %principal, error = %err, "rejected task proposal");
        })?;

        let task = Task::propose(
            TaskProposal {
                initiator: principal.identity().clone(),
                name: request.name,
                description: request.description,
                coordinators,
            },
            &*self.clock,
        );
        self.bounded("store", self.repository.store(&task)).await?;

        tracing::info!(
            task_id = %task.id(),
            initiator = %task.initiator(),
            coordinators = task.coordinators().len(),
            "task created"
        );
        self.notify(task.id(), self.trigger.on_created(&task));
        Ok(task)
    }

    /// Deletes a task created by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalServiceError::TaskNotFound`] for unknown or
    /// malformed identifiers, [`ApprovalServiceError::NotInitiator`] when
    /// `principal` did not create the task, and
    /// [`ApprovalDomainError::AlreadyResolved`] when the delete policy
    /// protects resolved tasks.
    pub async fn delete_task(
        &self,
        principal: &Principal,
        task_id: &str,
    ) -> ApprovalServiceResult<DeletionReceipt> {
        let task = self.load(task_id).await?;

        if task.initiator() != principal.identity() {
            tracing::debug!(task_id = %task.id(), actor = %principal, "delete refused");
            return Err(ApprovalServiceError::NotInitiator {
                task_id: task.id(),
                actor: principal.identity().clone(),
            });
        }
        if self.config.delete_policy == DeletePolicy::UnresolvedOnly && task.is_resolved() {
            return Err(ApprovalDomainError::AlreadyResolved {
                task_id: task.id(),
                status: task.status(),
            }
            .into());
        }

        self.bounded("delete", self.repository.delete(task.id()))
            .await?;
        tracing::info!(task_id = %task.id(), status = %task.status(), "task deleted");
        Ok(DeletionReceipt { task_id: task.id() })
    }

    /// Approves a task on behalf of its current turn-holder.
    ///
    /// # Errors
    ///
    /// See [`ApprovalService::decline`].
    pub async fn approve(
        &self,
        principal: &Principal,
        request: CoordinatorActionRequest,
    ) -> ApprovalServiceResult<ApprovalOutcome> {
        self.act(principal, request, ApprovalAction::Approve).await
    }

    /// Declines a task on behalf of its current turn-holder.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalServiceError::TaskNotFound`] for unknown or
    /// malformed identifiers, [`ApprovalServiceError::CoordinatorMismatch`]
    /// when the named coordinator is not `principal`,
    /// [`ApprovalDomainError::AlreadyResolved`] for resolved tasks,
    /// [`ApprovalDomainError::NotTurnHolder`] when it is not the principal's
    /// turn, [`ApprovalServiceError::Conflict`] when a concurrent transition
    /// committed first, and store errors.
    pub async fn decline(
        &self,
        principal: &Principal,
        request: CoordinatorActionRequest,
    ) -> ApprovalServiceResult<ApprovalOutcome> {
        self.act(principal, request, ApprovalAction::Decline).await
    }

    async fn act(
        &self,
        principal: &Principal,
        request: CoordinatorActionRequest,
        action: ApprovalAction,
    ) -> ApprovalServiceResult<ApprovalOutcome> {
        let task = self.load(&request.task_id).await?;
        let actor = principal.identity();

        if request.coordinator.trim() != actor.as_str() {
            tracing::debug!(
                task_id = %task.id(),
                actor = %actor,
                claimed = %request.coordinator,
                "coordinator does not match session"
            );
            return Err(ApprovalServiceError::CoordinatorMismatch {
                claimed: request.coordinator,
                actor: actor.clone(),
            });
        }

        let decision = decide(&task, actor, action).inspect_err(|err| {
            tracing::debug!(task_id = %task.id(), %action, error = %err, "action rejected");
        })?;

        let update = StatusUpdate {
            expected_revision: task.revision(),
            fields: decision.record.status_fields(),
            updated_at: self.clock.utc(),
        };
        let committed = self
            .bounded(
                "update_status_fields",
                self.repository.update_status_fields(task.id(), &update),
            )
            .await
            .inspect_err(|err| {
                if matches!(err, ApprovalServiceError::Conflict(_)) {
                    tracing::debug!(task_id = %task.id(), %action, "lost update detected");
                }
            })?;

        tracing::info!(
            task_id = %committed.id(),
            actor = %actor,
            %action,
            status = %committed.status(),
            next = committed.next(),
            "task transition committed"
        );
        self.notify(
            committed.id(),
            self.trigger
                .on_transition(&committed, actor, &decision.outcome),
        );

        Ok(match decision.outcome {
            TransitionOutcome::Advanced { turn_holder } => ApprovalOutcome::Advanced {
                task: committed,
                turn_holder,
            },
            TransitionOutcome::Approved => ApprovalOutcome::Approved { task: committed },
            TransitionOutcome::Declined => ApprovalOutcome::Declined { task: committed },
        })
    }

    async fn load(&self, raw_id: &str) -> ApprovalServiceResult<Task> {
        let task_id = TaskId::parse(raw_id)
            .map_err(|_| ApprovalServiceError::TaskNotFound(raw_id.to_owned()))?;
        self.bounded("find_by_id", self.repository.find_by_id(task_id))
            .await?
            .ok_or_else(|| ApprovalServiceError::TaskNotFound(task_id.to_string()))
    }

    /// Runs a store call under the configured timeout.
    ///
    /// A write the store itself rolled back for missing its deadline is
    /// reported the same way as an expired wait.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> ApprovalServiceResult<T>
    where
        F: Future<Output = TaskRepositoryResult<T>>,
    {
        let timeout = self.config.store_timeout();
        let Ok(result) = tokio::time::timeout(timeout, call).await else {
            tracing::error!(operation, ?timeout, "store call timed out");
            return Err(ApprovalServiceError::StoreTimeout { operation, timeout });
        };
        result.map_err(|err| match err {
            TaskRepositoryError::DeadlineExceeded { .. } => {
                tracing::error!(operation, ?timeout, "store rolled back a late write");
                ApprovalServiceError::StoreTimeout { operation, timeout }
            }
            TaskRepositoryError::Persistence(ref source) => {
                tracing::error!(operation, error = %source, "store call failed");
                ApprovalServiceError::from(err)
            }
            other => ApprovalServiceError::from(other),
        })
    }

    fn notify(
        &self,
        task_id: TaskId,
        notifications: Result<Vec<Notification>, NotificationRenderError>,
    ) {
        match notifications {
            Ok(notifications) => self.dispatcher.dispatch(notifications),
            Err(err) => {
                tracing::warn!(%task_id, error = %err, "notifications not sent");
            }
        }
    }
}
