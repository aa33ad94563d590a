//! Application services for sequential task approval.

mod approval;
mod dispatch;
mod error;
mod session;
mod trigger;

pub use approval::{
    AddTaskRequest, ApprovalOutcome, ApprovalService, CoordinatorActionRequest, DeletionReceipt,
    TaskSummary,
};
pub use dispatch::{DispatchError, DispatchReport, DispatchWorker, NotificationDispatcher};
pub use error::{ApprovalServiceError, ApprovalServiceResult, ErrorBody, ErrorKind};
pub use session::SessionVerifier;
pub use trigger::{NotificationRenderError, NotificationTrigger};
