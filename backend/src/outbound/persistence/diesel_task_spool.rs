//! PostgreSQL-backed job spool drained by the spool worker.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{debug, warn};

use crate::domain::Job;
use crate::domain::ports::{JobDispatchError, TaskSpool};

use super::diesel_helpers::limit_to_i64;
use super::models::NewSpooledTaskRow;
use super::pool::DbPool;
use super::schema::task_spool;

/// Appends serialised jobs to the `task_spool` table and claims them back.
#[derive(Clone)]
pub struct DieselTaskSpool {
    pool: DbPool,
}

impl DieselTaskSpool {
    /// Create a new spool with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(id: i64, payload: serde_json::Value) -> Option<Job> {
    serde_json::from_value(payload)
        .inspect_err(|err| warn!(spool_id = id, error = %err, "dropping undecodable spooled job"))
        .ok()
}

#[async_trait]
impl TaskSpool for DieselTaskSpool {
    async fn enqueue(&self, job: &Job) -> Result<(), JobDispatchError> {
        let payload = serde_json::to_value(job)
            .map_err(|err| JobDispatchError::rejected(err.to_string()))?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| JobDispatchError::unavailable(err.to_string()))?;
        diesel::insert_into(task_spool::table)
            .values(NewSpooledTaskRow {
                job_name: job.name(),
                payload,
            })
            .execute(&mut conn)
            .await
            .map_err(|err| {
                debug!(error = %err, job = job.name(), "spool insert failed");
                JobDispatchError::rejected("job could not be stored")
            })?;
        Ok(())
    }

    async fn claim(&self, limit: usize) -> Result<Vec<Job>, JobDispatchError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| JobDispatchError::unavailable(err.to_string()))?;
        // Rows locked by a concurrent claim are skipped rather than awaited.
        let rows: Vec<(i64, serde_json::Value)> = conn
            .transaction(|conn| {
                async move {
                    let rows: Vec<(i64, serde_json::Value)> = task_spool::table
                        .select((task_spool::id, task_spool::payload))
                        .order_by(task_spool::id.asc())
                        .limit(limit_to_i64(limit))
                        .for_update()
                        .skip_locked()
                        .load(conn)
                        .await?;
                    let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
                    diesel::delete(task_spool::table.filter(task_spool::id.eq_any(ids)))
                        .execute(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>(rows)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| JobDispatchError::unavailable(err.to_string()))?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, payload)| decode(id, payload))
            .collect())
    }
}
