//! PostgreSQL-backed vote and subscription repositories using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageWindow;
use tracing::warn;

use crate::domain::ports::{SubscriptionRepository, VoteRepository, VoteRepositoryError};
use crate::domain::{PostId, SubscriptionType, UserId, Vote, VoteToggle, VoteType};

use super::diesel_helpers::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error, window_bounds,
};
use super::models::{SubscriptionRow, VoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::{posts, subscriptions, votes};

/// Diesel-backed implementation of the vote repository port.
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Diesel-backed implementation of the subscription repository port.
#[derive(Clone)]
pub struct DieselSubscriptionRepository {
    pool: DbPool,
}

impl DieselSubscriptionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VoteRepositoryError {
    map_basic_pool_error(error, VoteRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> VoteRepositoryError {
    map_basic_diesel_error(error, VoteRepositoryError::query, VoteRepositoryError::connection)
}

fn vote_from_row(row: VoteRow) -> Vote {
    let vote_type = row.vote_type.parse::<VoteType>().unwrap_or_else(|_| {
        warn!(value = %row.vote_type, post_id = %row.post_id, "unrecognised vote type, treating as bookmark");
        VoteType::Bookmark
    });
    Vote {
        user_id: UserId::from(row.user_id),
        post_id: PostId::from(row.post_id),
        vote_type,
        date: row.created_at,
    }
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn toggle(
        &self,
        user_id: UserId,
        post_id: PostId,
        vote_type: VoteType,
        at: DateTime<Utc>,
    ) -> Result<VoteToggle, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = VoteRow {
            user_id: *user_id.as_uuid(),
            post_id: *post_id.as_uuid(),
            vote_type: vote_type.as_str().to_owned(),
            created_at: at,
        };

        conn.transaction(|conn| {
            async move {
                let removed = diesel::delete(
                    votes::table
                        .filter(votes::user_id.eq(row.user_id))
                        .filter(votes::post_id.eq(row.post_id))
                        .filter(votes::vote_type.eq(&row.vote_type)),
                )
                .execute(conn)
                .await?;
                if removed > 0 {
                    return Ok(VoteToggle::Removed);
                }
                diesel::insert_into(votes::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(VoteToggle::Added)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn count_received(&self, author: UserId) -> Result<u64, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = votes::table
            .inner_join(posts::table)
            .filter(posts::author_id.eq(*author.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(total))
    }

    async fn list_received(
        &self,
        author: UserId,
        window: PageWindow,
    ) -> Result<Vec<Vote>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = window_bounds(window);
        let rows: Vec<VoteRow> = votes::table
            .inner_join(posts::table)
            .filter(posts::author_id.eq(*author.as_uuid()))
            .order_by((votes::created_at.desc(), votes::post_id.desc()))
            .select(VoteRow::as_select())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(vote_from_row).collect())
    }
}

#[async_trait]
impl SubscriptionRepository for DieselSubscriptionRepository {
    async fn subscribe(
        &self,
        user_id: UserId,
        post_id: PostId,
        kind: SubscriptionType,
    ) -> Result<(), VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(subscriptions::table)
            .values(SubscriptionRow {
                user_id: *user_id.as_uuid(),
                post_id: *post_id.as_uuid(),
                kind: kind.code(),
            })
            .on_conflict((subscriptions::user_id, subscriptions::post_id))
            .do_update()
            .set(subscriptions::kind.eq(excluded(subscriptions::kind)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<SubscriptionType>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        subscriptions::table
            .filter(subscriptions::user_id.eq(*user_id.as_uuid()))
            .filter(subscriptions::post_id.eq(*post_id.as_uuid()))
            .select(subscriptions::kind)
            .first::<i16>(&mut conn)
            .await
            .optional()
            .map(|kind| kind.map(SubscriptionType::from_code))
            .map_err(map_diesel_error)
    }
}
