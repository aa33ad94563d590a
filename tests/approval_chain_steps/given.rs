//! Given steps for approval chain BDD scenarios.

use std::sync::Arc;

use super::world::{ApprovalChainWorld, principal, run_async};
use countersign::approval::services::{AddTaskRequest, ApprovalService, NotificationDispatcher};
use countersign::config::ApprovalConfig;
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given(r#""{initiator}" proposes a task for coordinators "{coordinators}""#)]
fn initiator_proposes_task(
    world: &mut ApprovalChainWorld,
    initiator: String,
    coordinators: String,
) -> Result<(), eyre::Report> {
    let (dispatcher, worker) = NotificationDispatcher::spawn(Arc::clone(&world.notifier))
        .wrap_err("start notification dispatch")?;
    let service = ApprovalService::new(
        Arc::clone(&world.repository),
        Arc::new(DefaultClock),
        Arc::new(ApprovalConfig::default()),
        dispatcher,
    );

    let request = AddTaskRequest::new("Release sign-off", coordinators.split(','))
        .with_description("Approve the release candidate");
    let task = run_async(service.add_task(&principal(&initiator)?, request))
        .wrap_err("propose task for approval chain scenario")?;

    world.service = Some(service);
    world.worker = Some(worker);
    world.task = Some(task);
    Ok(())
}
