//! Diesel row models for task persistence.

use super::schema::approval_tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = approval_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Task description.
    pub description: String,
    /// Initiator identity.
    pub initiator: String,
    /// Coordinator identities in turn order.
    pub coordinators: Vec<String>,
    /// Turn index.
    pub next_index: i32,
    /// Status code.
    pub status: i16,
    /// Revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = approval_tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Task description.
    pub description: String,
    /// Initiator identity.
    pub initiator: String,
    /// Coordinator identities in turn order.
    pub coordinators: Vec<String>,
    /// Turn index.
    pub next_index: i32,
    /// Status code.
    pub status: i16,
    /// Revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
