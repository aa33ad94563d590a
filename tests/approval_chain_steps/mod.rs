//! Step definitions for approval chain behaviour tests.

mod given;
mod then;
mod when;
