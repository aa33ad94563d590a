//! Concurrency tests for conditional status writes.
//!
//! Racing approvals go through a store that parks every armed read until all
//! racers hold the same snapshot, so exactly one conditional write can win.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::helpers::{Harness, RepositoryHarness, principal, propose};
use async_trait::async_trait;
use countersign::approval::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Identity, NotificationKind, Revision, StatusUpdate, Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryResult},
    services::{ApprovalOutcome, CoordinatorActionRequest, ErrorKind},
};
use countersign::config::ApprovalConfig;
use eyre::{Result, bail, ensure};
use tokio::sync::Barrier;
use tokio::task::JoinSet;

/// In-memory store whose reads wait for `racers` peers once armed.
struct GatedRepository {
    inner: InMemoryTaskRepository,
    gate: Barrier,
    armed: AtomicBool,
}

impl GatedRepository {
    fn new(racers: usize) -> Self {
        Self {
            inner: InMemoryTaskRepository::new(),
            gate: Barrier::new(racers),
            armed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TaskRepository for GatedRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.store(task).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let found = self.inner.find_by_id(id).await;
        if self.armed.load(Ordering::SeqCst) {
            self.gate.wait().await;
        }
        found
    }

    async fn find_by_initiator(&self, initiator: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_initiator(initiator).await
    }

    async fn update_status_fields(
        &self,
        id: TaskId,
        update: &StatusUpdate,
    ) -> TaskRepositoryResult<Task> {
        self.inner.update_status_fields(id, update).await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.inner.delete(id).await
    }
}

type GatedHarness = RepositoryHarness<GatedRepository>;

/// Lets every earlier coordinator approve, then races `racers` approvals by
/// `coordinator`.
async fn race(
    harness: &Arc<GatedHarness>,
    task: &Task,
    coordinator: &'static str,
    racers: usize,
) -> Result<(Vec<ApprovalOutcome>, Vec<ErrorKind>)> {
    harness.repository.armed.store(true, Ordering::SeqCst);

    let mut attempts = JoinSet::new();
    for _ in 0..racers {
        let harness = Arc::clone(harness);
        let raw = task.id().to_string();
        attempts.spawn(async move {
            let actor = principal(coordinator)?;
            let result = harness
                .service
                .approve(&actor, CoordinatorActionRequest::new(raw, coordinator))
                .await;
            Ok::<_, eyre::Report>(result.map_err(|err| err.kind()))
        });
    }

    let mut winners = Vec::new();
    let mut losers = Vec::new();
    while let Some(joined) = attempts.join_next().await {
        match joined?? {
            Ok(outcome) => winners.push(outcome),
            Err(kind) => losers.push(kind),
        }
    }
    harness.repository.armed.store(false, Ordering::SeqCst);
    Ok((winners, losers))
}

async fn stored(harness: &GatedHarness, task: &Task) -> Result<Task> {
    harness
        .repository
        .inner
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task should be stored"))
}

fn into_harness(harness: Arc<GatedHarness>) -> Result<GatedHarness> {
    Arc::into_inner(harness).ok_or_else(|| eyre::eyre!("racers still hold the harness"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_turn_holders_advance_the_chain_once() -> Result<()> {
    let racers = 4;
    let harness = Arc::new(GatedHarness::with_repository(
        GatedRepository::new(racers),
        ApprovalConfig::default(),
    )?);
    let task = propose(&harness, "ivan", &["alice", "bob"]).await?;

    let (winners, losers) = race(&harness, &task, "alice", racers).await?;
    let [winner] = winners.as_slice() else {
        bail!("expected exactly one commit, got {winners:?}");
    };
    ensure!(winner.message() == "you have approved this task: next coordinator: bob");
    ensure!(
        losers.len() == racers - 1 && losers.iter().all(|kind| *kind == ErrorKind::Conflict),
        "every loser should see a conflict, got {losers:?}"
    );

    let record = stored(&harness, &task).await?;
    ensure!(record.next() == 1);
    ensure!(record.status() == TaskStatus::InProgress);
    ensure!(record.revision() == Revision::new(1));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_final_approvals_resolve_the_task_once() -> Result<()> {
    let racers = 4;
    let harness = Arc::new(GatedHarness::with_repository(
        GatedRepository::new(racers),
        ApprovalConfig::default(),
    )?);
    let task = propose(&harness, "ivan", &["alice"]).await?;

    let (winners, losers) = race(&harness, &task, "alice", racers).await?;
    let [winner] = winners.as_slice() else {
        bail!("expected exactly one commit, got {winners:?}");
    };
    ensure!(matches!(winner, ApprovalOutcome::Approved { .. }));
    ensure!(winner.message() == "coordination end: approved");
    ensure!(
        losers.len() == racers - 1 && losers.iter().all(|kind| *kind == ErrorKind::Conflict),
        "every loser should see a conflict, got {losers:?}"
    );

    let record = stored(&harness, &task).await?;
    ensure!(record.status() == TaskStatus::Approved);
    ensure!(record.next() == 0);
    ensure!(record.revision() == Revision::new(1));

    let sent = into_harness(harness)?.settle().await?;
    let kinds: Vec<bool> = sent
        .iter()
        .map(|notification| notification.kind == NotificationKind::Info)
        .collect();
    ensure!(
        kinds == vec![false, true],
        "expected one request then one approval notice, got {sent:?}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_final_approval_after_earlier_turns_commits_once() -> Result<()> {
    let racers = 2;
    let harness = Arc::new(GatedHarness::with_repository(
        GatedRepository::new(racers),
        ApprovalConfig::default(),
    )?);
    let task = propose(&harness, "ivan", &["alice", "bob"]).await?;
    harness
        .service
        .approve(
            &principal("alice")?,
            CoordinatorActionRequest::new(task.id().to_string(), "alice"),
        )
        .await?;

    let (winners, losers) = race(&harness, &task, "bob", racers).await?;
    ensure!(winners.len() == 1, "expected exactly one commit, got {winners:?}");
    ensure!(losers == vec![ErrorKind::Conflict]);

    let record = stored(&harness, &task).await?;
    ensure!(record.status() == TaskStatus::Approved);
    ensure!(record.next() == 1);
    ensure!(record.revision() == Revision::new(2));

    let sent = into_harness(harness)?.settle().await?;
    let notices = sent
        .iter()
        .filter(|notification| notification.kind == NotificationKind::Info)
        .count();
    ensure!(notices == 2, "approval should reach each coordinator once, got {sent:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initiators_keep_separate_listings() -> Result<()> {
    let harness = Arc::new(Harness::start(ApprovalConfig::default())?);

    let mut proposals = JoinSet::new();
    for initiator in ["ivan", "judy", "ivan", "judy", "ivan"] {
        let harness = Arc::clone(&harness);
        proposals.spawn(async move { propose(&*harness, initiator, &["alice"]).await });
    }
    while let Some(joined) = proposals.join_next().await {
        joined??;
    }

    let ivan = harness.service.list_tasks(&principal("ivan")?).await?;
    let judy = harness.service.list_tasks(&principal("judy")?).await?;
    ensure!(ivan.len() == 3 && judy.len() == 2);
    ensure!(ivan.iter().all(|task| task.initiator().as_str() == "ivan"));
    Ok(())
}
