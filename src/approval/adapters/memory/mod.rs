//! In-memory adapters for tests and single-process deployments.

mod authenticator;
mod notifier;
mod task;

pub use authenticator::StaticTokenAuthenticator;
pub use notifier::RecordingNotifier;
pub use task::InMemoryTaskRepository;
