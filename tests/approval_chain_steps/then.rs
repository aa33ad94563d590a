//! Then steps for approval chain BDD scenarios.

use super::world::{ApprovalChainWorld, run_async};
use countersign::approval::{
    domain::{Identity, Task, TaskStatus},
    ports::TaskRepository,
};
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn stored_task(world: &ApprovalChainWorld) -> Result<Task, eyre::Report> {
    let id = world.task()?.id();
    run_async(world.repository.find_by_id(id))?
        .ok_or_else(|| eyre::eyre!("task {id} is missing from the store"))
}

#[then(r#"the action succeeds with message "{message}""#)]
fn action_succeeds(world: &ApprovalChainWorld, message: String) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(outcome)) if outcome.message() == message => Ok(()),
        other => Err(eyre::eyre!(
            "expected success with message {message:?}, got {other:?}"
        )),
    }
}

#[then(r#"the action fails with "{kind}""#)]
fn action_fails(world: &ApprovalChainWorld, kind: String) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(err)) if err.kind().as_str() == kind => Ok(()),
        other => Err(eyre::eyre!("expected {kind} failure, got {other:?}")),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ApprovalChainWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = stored_task(world)?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"the task awaits "{coordinator}""#)]
fn task_awaits(world: &ApprovalChainWorld, coordinator: String) -> Result<(), eyre::Report> {
    let expected = Identity::new(coordinator)?;
    let task = stored_task(world)?;
    if task.awaiting() != Some(&expected) {
        return Err(eyre::eyre!(
            "expected task to await {expected}, found {:?}",
            task.awaiting()
        ));
    }
    Ok(())
}

#[then("the task awaits nobody")]
fn task_awaits_nobody(world: &ApprovalChainWorld) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    if let Some(holder) = task.awaiting() {
        return Err(eyre::eyre!("expected a resolved task, still awaiting {holder}"));
    }
    Ok(())
}

#[then(r#""{recipient}" received {count:u64} notifications"#)]
fn recipient_received(
    world: &mut ApprovalChainWorld,
    recipient: String,
    count: u64,
) -> Result<(), eyre::Report> {
    // Dropping the service closes the queue so the worker can drain it.
    world.service = None;
    if let Some(worker) = world.worker.take() {
        run_async(worker.join()).wrap_err("drain notification queue")?;
    }

    let expected = Identity::new(recipient)?;
    let received = world
        .notifier
        .recipients()
        .into_iter()
        .filter(|identity| *identity == expected)
        .count();
    if u64::try_from(received)? != count {
        return Err(eyre::eyre!(
            "expected {count} notifications for {expected}, found {received}"
        ));
    }
    Ok(())
}
