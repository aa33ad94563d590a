//! Countersign: sequential multi-party task approval.
//!
//! An initiator proposes a task naming an ordered chain of coordinators.
//! Each coordinator approves or declines in turn; the first decline ends
//! the chain and the last approval resolves it.
//!
//! # Architecture
//!
//! Countersign follows hexagonal architecture principles:
//!
//! - **Domain**: The approval state machine, free of infrastructure
//! - **Ports**: Traits for the task store, notifier, and authenticator
//! - **Adapters**: In-memory, `PostgreSQL`, and logging implementations
//! - **Services**: Orchestration of reads, conditional writes, and
//!   post-commit notifications
//!
//! # Modules
//!
//! - [`approval`]: Domain, ports, adapters, and services
//! - [`config`]: Process-wide settings
//! - [`telemetry`]: Tracing subscriber installation

pub mod approval;
pub mod config;
pub mod telemetry;
