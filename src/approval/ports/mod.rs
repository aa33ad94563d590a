//! Port contracts for sequential task approval.
//!
//! Ports define infrastructure-agnostic interfaces for the store, the
//! notifier, and the authenticator used by approval services.

pub mod authenticator;
pub mod notifier;
pub mod repository;

pub use authenticator::{AuthenticationError, Authenticator, Credentials};
pub use notifier::{Notifier, NotifierError};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
