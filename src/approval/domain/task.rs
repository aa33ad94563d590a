//! Task aggregate root, coordinator chain, and status types.

use super::{ApprovalDomainError, Identity, ParseTaskStatusError, Revision, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No coordinator has acted yet.
    NotStarted,
    /// At least one coordinator has approved and more remain.
    InProgress,
    /// Every coordinator approved the task.
    Approved,
    /// A coordinator declined the task.
    Declined,
}

impl TaskStatus {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Returns the durable small-integer code.
    ///
    /// Zero is reserved as an invalid marker and never produced.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::NotStarted => 1,
            Self::InProgress => 2,
            Self::Approved => 3,
            Self::Declined => 4,
        }
    }

    /// Returns `true` when no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl TryFrom<i16> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::NotStarted),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Approved),
            4 => Ok(Self::Declined),
            _ => Err(ParseTaskStatusError(value.to_string())),
        }
    }
}

/// Ordered, non-empty sequence of coordinators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Identity>", into = "Vec<Identity>")]
pub struct CoordinatorChain(Vec<Identity>);

impl CoordinatorChain {
    /// Creates a coordinator chain.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalDomainError::EmptyCoordinators`] when no coordinator
    /// is given.
    pub fn new(coordinators: Vec<Identity>) -> Result<Self, ApprovalDomainError> {
        if coordinators.is_empty() {
            return Err(ApprovalDomainError::EmptyCoordinators);
        }
        Ok(Self(coordinators))
    }

    /// Parses a chain from raw identity strings.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalDomainError::EmptyIdentity`] for a blank entry or
    /// [`ApprovalDomainError::EmptyCoordinators`] for an empty list.
    pub fn parse<I, S>(raw: I) -> Result<Self, ApprovalDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let coordinators = raw
            .into_iter()
            .map(Identity::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(coordinators)
    }

    /// Returns the number of coordinators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the coordinator at `position`, if any.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Identity> {
        self.0.get(position)
    }

    /// Returns the coordinators in turn order.
    #[must_use]
    pub fn as_slice(&self) -> &[Identity] {
        &self.0
    }

    /// Iterates over the coordinators in turn order.
    pub fn iter(&self) -> std::slice::Iter<'_, Identity> {
        self.0.iter()
    }
}

impl TryFrom<Vec<Identity>> for CoordinatorChain {
    type Error = ApprovalDomainError;

    fn try_from(value: Vec<Identity>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CoordinatorChain> for Vec<Identity> {
    fn from(value: CoordinatorChain) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a CoordinatorChain {
    type Item = &'a Identity;
    type IntoIter = std::slice::Iter<'a, Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The mutable part of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusFields {
    /// Zero-based index of the coordinator whose turn it is.
    pub next: usize,
    /// Approval status.
    pub status: TaskStatus,
}

/// Conditional status write issued against the task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Revision the caller read; the write fails if the stored one differs.
    pub expected_revision: Revision,
    /// New status fields.
    pub fields: StatusFields,
    /// Timestamp recorded with the write.
    pub updated_at: DateTime<Utc>,
}

/// Input for proposing a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProposal {
    /// Identity creating the task.
    pub initiator: Identity,
    /// Free-text task name.
    pub name: String,
    /// Free-text task description.
    pub description: String,
    /// Coordinators in turn order.
    pub coordinators: CoordinatorChain,
}

/// Task aggregate root.
///
/// Deserialization goes through [`PersistedTaskData`] so a decoded task obeys
/// the same turn-index rule as one loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedTaskData")]
pub struct Task {
    id: TaskId,
    name: String,
    description: String,
    initiator: Identity,
    coordinators: CoordinatorChain,
    next: usize,
    status: TaskStatus,
    revision: Revision,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: String,
    /// Persisted task description.
    pub description: String,
    /// Persisted initiator.
    pub initiator: Identity,
    /// Persisted coordinator chain.
    pub coordinators: CoordinatorChain,
    /// Persisted turn index.
    pub next: usize,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted revision.
    pub revision: Revision,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PersistedTaskData> for Task {
    type Error = ApprovalDomainError;

    fn try_from(data: PersistedTaskData) -> Result<Self, Self::Error> {
        Self::from_persisted(data)
    }
}

impl Task {
    /// Creates a new task awaiting its first coordinator.
    #[must_use]
    pub fn propose(proposal: TaskProposal, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            name: proposal.name,
            description: proposal.description,
            initiator: proposal.initiator,
            coordinators: proposal.coordinators,
            next: 0,
            status: TaskStatus::NotStarted,
            revision: Revision::INITIAL,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalDomainError::TurnOutOfRange`] when a non-terminal
    /// record points past the end of its coordinator chain.
    pub fn from_persisted(data: PersistedTaskData) -> Result<Self, ApprovalDomainError> {
        if !data.status.is_terminal() && data.next >= data.coordinators.len() {
            return Err(ApprovalDomainError::TurnOutOfRange {
                task_id: data.id,
                next: data.next,
                len: data.coordinators.len(),
            });
        }

        Ok(Self {
            id: data.id,
            name: data.name,
            description: data.description,
            initiator: data.initiator,
            coordinators: data.coordinators,
            next: data.next,
            status: data.status,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the identity that created the task.
    #[must_use]
    pub const fn initiator(&self) -> &Identity {
        &self.initiator
    }

    /// Returns the coordinator chain.
    #[must_use]
    pub const fn coordinators(&self) -> &CoordinatorChain {
        &self.coordinators
    }

    /// Returns the turn index.
    #[must_use]
    pub const fn next(&self) -> usize {
        self.next
    }

    /// Returns the approval status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the mutable status fields.
    #[must_use]
    pub const fn status_fields(&self) -> StatusFields {
        StatusFields {
            next: self.next,
            status: self.status,
        }
    }

    /// Returns the stored revision.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` once the task is approved or declined.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the coordinator at the turn index.
    ///
    /// Once the task is resolved this is the coordinator who acted last.
    #[must_use]
    pub fn turn_holder(&self) -> Option<&Identity> {
        self.coordinators.get(self.next)
    }

    /// Returns the coordinator expected to act next, if the task is open.
    #[must_use]
    pub fn awaiting(&self) -> Option<&Identity> {
        if self.is_resolved() {
            return None;
        }
        self.turn_holder()
    }

    /// Returns a copy carrying different status fields.
    ///
    /// Revision and timestamps are untouched; those change only when the
    /// store commits the update.
    #[must_use]
    pub fn with_status_fields(&self, fields: StatusFields) -> Self {
        Self {
            next: fields.next,
            status: fields.status,
            ..self.clone()
        }
    }

    /// Returns the record as committed by a successful conditional write.
    #[must_use]
    pub fn committed(&self, update: &StatusUpdate) -> Self {
        Self {
            next: update.fields.next,
            status: update.fields.status,
            revision: update.expected_revision.next(),
            updated_at: update.updated_at,
            ..self.clone()
        }
    }
}
