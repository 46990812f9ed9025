//! PostgreSQL-backed append-only moderation log.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ModerationLogError, ModerationLogRepository};
use crate::domain::{ModerationChange, ModerationLog, NewModerationLog, rank_at};

use super::diesel_helpers::{limit_to_i64, map_basic_diesel_error, map_basic_pool_error};
use super::models::{ModerationLogRow, NewModerationLogRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::log_from_row;
use super::schema::{moderation_logs, posts, profiles};

/// Diesel-backed implementation of the moderation log port.
#[derive(Clone)]
pub struct DieselModerationLogRepository {
    pool: DbPool,
}

impl DieselModerationLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ModerationLogError {
    map_basic_pool_error(error, ModerationLogError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ModerationLogError {
    map_basic_diesel_error(error, ModerationLogError::query, ModerationLogError::connection)
}

/// Failure inside the moderation transaction.
enum ApplyError {
    Missing(String),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for ApplyError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

/// Run one change, returning the number of rows it touched.
async fn execute_change(
    conn: &mut AsyncPgConnection,
    change: ModerationChange,
) -> Result<usize, diesel::result::Error> {
    match change {
        ModerationChange::SetSpam { post_id, spam } => {
            diesel::update(posts::table.filter(posts::id.eq(*post_id.as_uuid())))
                .set(posts::spam.eq(spam.code()))
                .execute(conn)
                .await
        }
        ModerationChange::SetStatus { post_id, status } => {
            diesel::update(posts::table.filter(posts::id.eq(*post_id.as_uuid())))
                .set(posts::status.eq(status.code()))
                .execute(conn)
                .await
        }
        ModerationChange::Bump { post_id, at } => {
            diesel::update(posts::table.filter(posts::id.eq(*post_id.as_uuid())))
                .set((posts::rank.eq(rank_at(at)), posts::lastedit_date.eq(at)))
                .execute(conn)
                .await
        }
        ModerationChange::SetState { user_id, state } => {
            diesel::update(profiles::table.filter(profiles::user_id.eq(*user_id.as_uuid())))
                .set(profiles::state.eq(state.code()))
                .execute(conn)
                .await
        }
        ModerationChange::AdjustScore { user_id, delta } => {
            diesel::update(profiles::table.filter(profiles::user_id.eq(*user_id.as_uuid())))
                .set(profiles::score.eq(profiles::score + delta))
                .execute(conn)
                .await
        }
    }
}

fn describe(change: &ModerationChange) -> String {
    match change {
        ModerationChange::SetSpam { post_id, .. }
        | ModerationChange::SetStatus { post_id, .. }
        | ModerationChange::Bump { post_id, .. } => format!("post {post_id}"),
        ModerationChange::SetState { user_id, .. } | ModerationChange::AdjustScore { user_id, .. } => {
            format!("user {user_id}")
        }
    }
}

#[async_trait]
impl ModerationLogRepository for DieselModerationLogRepository {
    async fn apply(
        &self,
        changes: Vec<ModerationChange>,
        entry: NewModerationLog,
    ) -> Result<ModerationLog, ModerationLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let result = conn
            .transaction(|conn| {
                async move {
                    for change in changes {
                        if execute_change(conn, change).await? == 0 {
                            return Err(ApplyError::Missing(describe(&change)));
                        }
                    }
                    let row = diesel::insert_into(moderation_logs::table)
                        .values(NewModerationLogRow {
                            actor_id: *entry.actor_id.as_uuid(),
                            target_user_id: entry.target_user_id.map(|id| *id.as_uuid()),
                            post_id: entry.post_id.map(|id| *id.as_uuid()),
                            action: &entry.action,
                            created_at: entry.created_at,
                        })
                        .returning(ModerationLogRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok::<_, ApplyError>(row)
                }
                .scope_boxed()
            })
            .await;
        match result {
            Ok(row) => Ok(log_from_row(row)),
            Err(ApplyError::Missing(target)) => Err(ModerationLogError::missing_target(target)),
            Err(ApplyError::Diesel(error)) => Err(map_diesel_error(error)),
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ModerationLog>, ModerationLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ModerationLogRow> = moderation_logs::table
            .order_by((moderation_logs::created_at.desc(), moderation_logs::id.desc()))
            .select(ModerationLogRow::as_select())
            .limit(limit_to_i64(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(log_from_row).collect())
    }
}
