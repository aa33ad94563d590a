//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{NewTaskRow, TaskRow},
    schema::approval_tasks,
};
use crate::approval::{
    domain::{
        CoordinatorChain, Identity, PersistedTaskData, Revision, StatusUpdate, Task, TaskId,
        TaskStatus,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::time::{Duration, Instant};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Writes run inside a transaction. With a write timeout configured, each
/// write gets a deadline fixed before it is handed to the blocking pool: the
/// server cancels statements that outlive it and the transaction rolls back
/// instead of committing once it has passed.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
    write_timeout: Option<Duration>,
}

/// Point in time after which a write must not commit.
#[derive(Debug, Clone, Copy)]
struct WriteDeadline {
    timeout: Duration,
    expires_at: Instant,
}

impl WriteDeadline {
    /// Returns `None` when the deadline is too far out to represent.
    fn starting_now(timeout: Duration) -> Option<Self> {
        Instant::now()
            .checked_add(timeout)
            .map(|expires_at| Self {
                timeout,
                expires_at,
            })
    }

    fn remaining(self) -> Option<Duration> {
        remaining_until(self.expires_at, Instant::now())
    }

    const fn exceeded(self) -> TaskRepositoryError {
        TaskRepositoryError::DeadlineExceeded {
            timeout: self.timeout,
        }
    }
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self {
            pool,
            write_timeout: None,
        }
    }

    /// Bounds every write by `timeout`.
    ///
    /// Pass the same value the service uses for its store timeout so a write
    /// the caller gave up on is rolled back rather than committed later.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    /// Runs `f` in a transaction that commits only before the write deadline.
    async fn run_write<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = self.write_timeout.and_then(WriteDeadline::starting_now);
        self.run_blocking(move |connection| {
            let Some(deadline) = deadline else {
                return connection.transaction::<_, TaskRepositoryError, _>(f);
            };
            let budget = deadline.remaining().ok_or_else(|| deadline.exceeded())?;
            let result = connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::sql_query(statement_timeout_sql(budget)).execute(tx)?;
                let value = f(tx)?;
                if deadline.remaining().is_none() {
                    return Err(deadline.exceeded());
                }
                Ok(value)
            });
            match result {
                // A statement cancelled by the server surfaces as a database
                // error; past the deadline it is the deadline that failed.
                Err(TaskRepositoryError::Persistence(_)) if deadline.remaining().is_none() => {
                    Err(deadline.exceeded())
                }
                other => other,
            }
        })
        .await
    }
}

/// Time left before `deadline`, or `None` once it has been reached.
fn remaining_until(deadline: Instant, now: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(now)
        .filter(|left| !left.is_zero())
}

/// `SET LOCAL` statement bounding each statement of the current transaction.
///
/// `PostgreSQL` reads a zero timeout as "no limit", so the budget is rounded
/// up to at least one millisecond.
fn statement_timeout_sql(budget: Duration) -> String {
    let millis = budget.as_millis().max(1);
    format!("SET LOCAL statement_timeout = {millis}")
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;

        self.run_write(move |connection| {
            diesel::insert_into(approval_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = approval_tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_initiator(&self, initiator: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        let lookup_initiator = initiator.as_str().to_owned();
        self.run_blocking(move |connection| {
            approval_tasks::table
                .filter(approval_tasks::initiator.eq(lookup_initiator))
                .order(approval_tasks::created_at.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn update_status_fields(
        &self,
        id: TaskId,
        update: &StatusUpdate,
    ) -> TaskRepositoryResult<Task> {
        let expected_revision = update.expected_revision;
        let expected = revision_to_column(expected_revision)?;
        let committed = revision_to_column(expected_revision.next())?;
        let next_index =
            i32::try_from(update.fields.next).map_err(TaskRepositoryError::persistence)?;
        let status = update.fields.status.code();
        let updated_at = update.updated_at;

        self.run_write(move |connection| {
            let row = diesel::update(
                approval_tasks::table
                    .filter(approval_tasks::id.eq(id.into_inner()))
                    .filter(approval_tasks::revision.eq(expected)),
            )
            .set((
                approval_tasks::next_index.eq(next_index),
                approval_tasks::status.eq(status),
                approval_tasks::revision.eq(committed),
                approval_tasks::updated_at.eq(updated_at),
            ))
            .returning(TaskRow::as_returning())
            .get_result::<TaskRow>(connection)
            .optional()
            .map_err(TaskRepositoryError::persistence)?;

            match row {
                Some(row) => row_to_task(row),
                None => Err(explain_missed_update(connection, id, expected_revision)),
            }
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_write(move |connection| {
            let deleted = diesel::delete(approval_tasks::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

/// Works out why a conditional update touched no row.
fn explain_missed_update(
    connection: &mut PgConnection,
    id: TaskId,
    expected: Revision,
) -> TaskRepositoryError {
    let stored = approval_tasks::table
        .find(id.into_inner())
        .select(approval_tasks::revision)
        .first::<i64>(connection)
        .optional();

    match stored {
        Ok(None) => TaskRepositoryError::NotFound(id),
        Ok(Some(actual)) => match revision_from_column(actual) {
            Ok(actual) => TaskRepositoryError::Conflict {
                task_id: id,
                expected,
                actual,
            },
            Err(err) => err,
        },
        Err(err) => TaskRepositoryError::persistence(err),
    }
}

fn revision_to_column(revision: Revision) -> TaskRepositoryResult<i64> {
    i64::try_from(revision.value()).map_err(TaskRepositoryError::persistence)
}

fn revision_from_column(value: i64) -> TaskRepositoryResult<Revision> {
    u64::try_from(value)
        .map(Revision::new)
        .map_err(TaskRepositoryError::persistence)
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        name: task.name().to_owned(),
        description: task.description().to_owned(),
        initiator: task.initiator().as_str().to_owned(),
        coordinators: task
            .coordinators()
            .iter()
            .map(|coordinator| coordinator.as_str().to_owned())
            .collect(),
        next_index: i32::try_from(task.next()).map_err(TaskRepositoryError::persistence)?,
        status: task.status().code(),
        revision: revision_to_column(task.revision())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        name,
        description,
        initiator,
        coordinators,
        next_index,
        status,
        revision,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        name,
        description,
        initiator: Identity::new(initiator).map_err(TaskRepositoryError::persistence)?,
        coordinators: CoordinatorChain::parse(coordinators)
            .map_err(TaskRepositoryError::persistence)?,
        next: usize::try_from(next_index).map_err(TaskRepositoryError::persistence)?,
        status: TaskStatus::try_from(status).map_err(TaskRepositoryError::persistence)?,
        revision: revision_from_column(revision)?,
        created_at,
        updated_at,
    };
    Task::from_persisted(data).map_err(TaskRepositoryError::persistence)
}
