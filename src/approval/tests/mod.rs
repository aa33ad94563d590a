//! Unit tests for the approval module.
//!
//! Tests are organised by layer: domain types, the state machine and its
//! properties, notification translation and dispatch, the in-memory store,
//! and service orchestration.


use crate::approval::domain::{CoordinatorChain, Identity, Task, TaskProposal};
use mockable::DefaultClock;

fn identity(name: &str) -> Identity {
    Identity::new(name).expect("test identities are non-empty")
}

fn proposed_task(initiator: &str, coordinators: &[&str]) -> Task {
    Task::propose(
        TaskProposal {
            initiator: identity(initiator),
            name: "Quarterly budget".to_owned(),
            description: "Sign off the Q3 budget".to_owned(),
            coordinators: CoordinatorChain::parse(coordinators.iter().copied())
                .expect("test chains are non-empty"),
        },
        &DefaultClock,
    )
}
