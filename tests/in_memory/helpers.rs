//! Shared test helpers for in-memory approval integration tests.

use std::sync::Arc;

use countersign::approval::{
    adapters::memory::{InMemoryTaskRepository, RecordingNotifier},
    domain::{Identity, Notification, Principal, Task},
    ports::TaskRepository,
    services::{AddTaskRequest, ApprovalService, DispatchWorker, NotificationDispatcher},
};
use countersign::config::ApprovalConfig;
use mockable::DefaultClock;

/// Service wired to a test store and a recording notifier, plus handles for
/// inspecting them.
pub struct RepositoryHarness<R: TaskRepository> {
    pub service: ApprovalService<R, DefaultClock>,
    pub repository: Arc<R>,
    pub notifier: Arc<RecordingNotifier>,
    worker: DispatchWorker,
}

/// Harness over the in-memory store.
pub type Harness = RepositoryHarness<InMemoryTaskRepository>;

impl Harness {
    /// Builds a harness on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatch worker cannot start.
    pub fn start(config: ApprovalConfig) -> Result<Self, eyre::Report> {
        RepositoryHarness::with_repository(InMemoryTaskRepository::new(), config)
    }
}

impl<R: TaskRepository> RepositoryHarness<R> {
    /// Builds a harness around `repository` on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatch worker cannot start.
    pub fn with_repository(repository: R, config: ApprovalConfig) -> Result<Self, eyre::Report> {
        let repository = Arc::new(repository);
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, worker) = NotificationDispatcher::spawn(Arc::clone(&notifier))?;
        let service = ApprovalService::new(
            Arc::clone(&repository),
            Arc::new(DefaultClock),
            Arc::new(config),
            dispatcher,
        );
        Ok(Self {
            service,
            repository,
            notifier,
            worker,
        })
    }

    /// Stops the service and returns every delivered notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatch worker failed.
    pub async fn settle(self) -> Result<Vec<Notification>, eyre::Report> {
        let Self {
            service,
            notifier,
            worker,
            ..
        } = self;
        drop(service);
        worker.join().await?;
        Ok(notifier.sent())
    }
}

/// Builds a principal for a test identity.
///
/// # Errors
///
/// Returns an error if `name` is blank.
pub fn principal(name: &str) -> Result<Principal, eyre::Report> {
    Ok(Principal::new(Identity::new(name)?))
}

/// Proposes a task from `initiator` to `coordinators`.
///
/// # Errors
///
/// Returns an error if the service rejects the proposal.
pub async fn propose<R: TaskRepository>(
    harness: &RepositoryHarness<R>,
    initiator: &str,
    coordinators: &[&str],
) -> Result<Task, eyre::Report> {
    let request = AddTaskRequest::new("Vendor contract", coordinators.iter().copied())
        .with_description("Renew the vendor contract");
    Ok(harness
        .service
        .add_task(&principal(initiator)?, request)
        .await?)
}
