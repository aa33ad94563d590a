//! When steps for approval chain BDD scenarios.

use super::world::{ApprovalChainWorld, principal, run_async};
use countersign::approval::services::CoordinatorActionRequest;
use rstest_bdd_macros::when;

#[when(r#""{coordinator}" approves the task"#)]
fn coordinator_approves(
    world: &mut ApprovalChainWorld,
    coordinator: String,
) -> Result<(), eyre::Report> {
    let request = CoordinatorActionRequest::new(world.task()?.id().to_string(), &coordinator);
    let result = run_async(
        world
            .service()?
            .approve(&principal(&coordinator)?, request),
    );
    world.last_result = Some(result);
    Ok(())
}

#[when(r#""{coordinator}" declines the task"#)]
fn coordinator_declines(
    world: &mut ApprovalChainWorld,
    coordinator: String,
) -> Result<(), eyre::Report> {
    let request = CoordinatorActionRequest::new(world.task()?.id().to_string(), &coordinator);
    let result = run_async(
        world
            .service()?
            .decline(&principal(&coordinator)?, request),
    );
    world.last_result = Some(result);
    Ok(())
}

#[when(r#""{actor}" follows the approve link addressed to "{coordinator}""#)]
fn actor_follows_foreign_link(
    world: &mut ApprovalChainWorld,
    actor: String,
    coordinator: String,
) -> Result<(), eyre::Report> {
    let request = CoordinatorActionRequest::new(world.task()?.id().to_string(), coordinator);
    let result = run_async(world.service()?.approve(&principal(&actor)?, request));
    world.last_result = Some(result);
    Ok(())
}
