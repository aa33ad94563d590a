//! Domain model for sequential task approval.
//!
//! The domain owns the task record, the coordinator chain, and the pure
//! approval state machine. Persistence, delivery, and identity verification
//! stay outside of the domain boundary.

mod decision;
mod error;
mod ids;
mod notification;
mod task;

pub use decision::{ApprovalAction, Decision, TransitionOutcome, decide};
pub use error::{ApprovalDomainError, ParseTaskIdError, ParseTaskStatusError};
pub use ids::{Identity, Principal, Revision, TaskId};
pub use notification::{Notification, NotificationKind};
pub use task::{
    CoordinatorChain, PersistedTaskData, StatusFields, StatusUpdate, Task, TaskProposal,
    TaskStatus,
};
