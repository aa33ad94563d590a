//! Adapter implementations of the approval ports.

pub mod log;
pub mod memory;
pub mod postgres;
