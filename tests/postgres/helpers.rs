//! Shared test helpers for `PostgreSQL` integration tests.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use countersign::approval::{
    adapters::postgres::{PostgresTaskRepository, TaskPgPool},
    domain::{
        CoordinatorChain, Identity, PersistedTaskData, Revision, StatusFields, StatusUpdate, Task,
        TaskId, TaskStatus,
    },
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;

/// Boxed error used by setup helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the task table.
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_approval_tasks/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "countersign_test_template";

/// Creates a tokio runtime for driving the async repository in tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_TASKS_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Per-test database created from the template, dropped on scope exit.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
    pool: TaskPgPool,
}

impl TestDatabase {
    /// Creates a fresh database from the migrated template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template or database cannot be created.
    pub fn create(cluster: &'static TestCluster) -> Result<Self, BoxError> {
        ensure_template(cluster)?;
        let name = format!("test_tasks_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| Box::new(e) as BoxError)?;
        let manager = ConnectionManager::<PgConnection>::new(cluster.connection().database_url(&name));
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(Self {
            cluster,
            name,
            pool,
        })
    }

    /// Repository without a write deadline.
    pub fn repository(&self) -> PostgresTaskRepository {
        PostgresTaskRepository::new(self.pool.clone())
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.name);
        }
    }
}

/// Fixed base timestamp so ordering assertions do not depend on the clock.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Builds an unstarted task created `offset_minutes` after [`base_time`].
pub fn task_created_at(initiator: &str, coordinators: &[&str], offset_minutes: i64) -> Task {
    let created_at = base_time() + ChronoDuration::minutes(offset_minutes);
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        name: "Vendor contract".to_owned(),
        description: "Renew the vendor contract".to_owned(),
        initiator: Identity::new(initiator).expect("valid initiator"),
        coordinators: CoordinatorChain::parse(coordinators.iter().copied())
            .expect("valid chain"),
        next: 0,
        status: TaskStatus::NotStarted,
        revision: Revision::INITIAL,
        created_at,
        updated_at: created_at,
    })
    .expect("valid task")
}

/// Status write moving `task` on to `next` under `expected_revision`.
pub fn advance_to(task: &Task, expected_revision: Revision, next: usize) -> StatusUpdate {
    StatusUpdate {
        expected_revision,
        fields: StatusFields {
            next,
            status: TaskStatus::InProgress,
        },
        updated_at: task.updated_at() + ChronoDuration::minutes(1),
    }
}
