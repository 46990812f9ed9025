//! PostgreSQL-backed `TagRepository` implementation using Diesel ORM.
//!
//! Counts only tags of visible threads: open, not spam, top-level.

use async_trait::async_trait;
use diesel::dsl::{count_distinct, count_star};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageWindow;

use crate::domain::ports::{TagCount, TagRepository, TagRepositoryError};
use crate::domain::{PostStatus, SpamStatus};

use super::diesel_helpers::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error, window_bounds,
};
use super::pool::{DbPool, PoolError};
use super::schema::{post_tags, posts};

/// Diesel-backed implementation of the tag repository port.
#[derive(Clone)]
pub struct DieselTagRepository {
    pool: DbPool,
}

impl DieselTagRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TagRepositoryError {
    map_basic_pool_error(error, TagRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TagRepositoryError {
    map_basic_diesel_error(error, TagRepositoryError::query, TagRepositoryError::connection)
}

/// `ILIKE` pattern for an optional substring filter; no filter matches
/// every tag.
fn tag_pattern(filter: Option<&str>) -> String {
    format!("%{}%", filter.unwrap_or_default())
}

#[async_trait]
impl TagRepository for DieselTagRepository {
    async fn count_tags(&self, filter: Option<String>) -> Result<u64, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = post_tags::table
            .inner_join(posts::table)
            .filter(posts::is_toplevel.eq(true))
            .filter(posts::status.eq(PostStatus::Open.code()))
            .filter(posts::spam.eq(SpamStatus::NotSpam.code()))
            .filter(post_tags::tag.ilike(tag_pattern(filter.as_deref())))
            .select(count_distinct(post_tags::tag))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(total))
    }

    async fn list_tags(
        &self,
        filter: Option<String>,
        window: PageWindow,
    ) -> Result<Vec<TagCount>, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = window_bounds(window);
        let rows: Vec<(String, i64)> = post_tags::table
            .inner_join(posts::table)
            .filter(posts::is_toplevel.eq(true))
            .filter(posts::status.eq(PostStatus::Open.code()))
            .filter(posts::spam.eq(SpamStatus::NotSpam.code()))
            .filter(post_tags::tag.ilike(tag_pattern(filter.as_deref())))
            .group_by(post_tags::tag)
            .select((post_tags::tag, count_star()))
            .order_by((count_star().desc(), post_tags::tag.asc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(name, count)| TagCount {
                name,
                post_count: count_to_u64(count),
            })
            .collect())
    }
}
