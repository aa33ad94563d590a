//! Sequential multi-party approval of named tasks.
//!
//! An initiator proposes a task together with an ordered chain of
//! coordinators. Each coordinator, strictly in turn, approves or declines the
//! task until it is resolved. The module follows hexagonal architecture:
//!
//! - Domain types and the approval state machine in [`domain`]
//! - Port contracts for the store, notifier, and authenticator in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
