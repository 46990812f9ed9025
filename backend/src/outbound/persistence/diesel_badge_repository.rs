//! PostgreSQL-backed `BadgeRepository` implementation using Diesel ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageWindow;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{BadgeRepository, BadgeRepositoryError};
use crate::domain::{
    AwardDefinition, AwardRecord, Badge, BadgeId, BadgeWithCount, PostId, UserId,
};

use super::diesel_helpers::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error, window_bounds,
};
use super::models::{AwardRow, BadgeRow, NewAwardRow, NewBadgeRow, ProfileRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{badge_from_row, profile_from_row};
use super::schema::{awards, badges, profiles};

/// Diesel-backed implementation of the badge repository port.
#[derive(Clone)]
pub struct DieselBadgeRepository {
    pool: DbPool,
}

impl DieselBadgeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BadgeRepositoryError {
    map_basic_pool_error(error, BadgeRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BadgeRepositoryError {
    map_basic_diesel_error(error, BadgeRepositoryError::query, BadgeRepositoryError::connection)
}

#[async_trait]
impl BadgeRepository for DieselBadgeRepository {
    async fn upsert(&self, definition: &AwardDefinition) -> Result<Badge, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(badges::table)
            .values(NewBadgeRow {
                name: definition.name,
                description: definition.description,
                icon: definition.icon,
                kind: definition.kind.code(),
            })
            .on_conflict(badges::name)
            .do_update()
            .set((
                badges::description.eq(excluded(badges::description)),
                badges::icon.eq(excluded(badges::icon)),
                badges::kind.eq(excluded(badges::kind)),
            ))
            .returning(BadgeRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(badge_from_row)
            .map_err(map_diesel_error)
    }

    async fn list_with_counts(&self) -> Result<Vec<BadgeWithCount>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BadgeRow> = badges::table
            .select(BadgeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let counts: HashMap<i64, i64> = awards::table
            .group_by(awards::badge_id)
            .select((awards::badge_id, count_star()))
            .load::<(i64, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let mut listed: Vec<BadgeWithCount> = rows
            .into_iter()
            .map(|row| {
                let award_count = count_to_u64(counts.get(&row.id).copied().unwrap_or_default());
                BadgeWithCount {
                    badge: badge_from_row(row),
                    award_count,
                }
            })
            .collect();
        listed.sort_by(|a, b| {
            b.award_count
                .cmp(&a.award_count)
                .then_with(|| a.badge.name.cmp(&b.badge.name))
        });
        Ok(listed)
    }

    async fn find(&self, id: BadgeId) -> Result<Option<Badge>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        badges::table
            .filter(badges::id.eq(id))
            .select(BadgeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(badge_from_row))
            .map_err(map_diesel_error)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Badge>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        badges::table
            .filter(badges::name.eq(name))
            .select(BadgeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(badge_from_row))
            .map_err(map_diesel_error)
    }

    async fn count_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
    ) -> Result<u64, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = awards::table
            .filter(awards::badge_id.eq(badge_id))
            .into_boxed();
        if let Some(user_id) = user_id {
            statement = statement.filter(awards::user_id.eq(*user_id.as_uuid()));
        }
        let total: i64 = statement
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(total))
    }

    async fn list_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
        window: PageWindow,
    ) -> Result<Vec<AwardRecord>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = window_bounds(window);
        let mut statement = awards::table
            .filter(awards::badge_id.eq(badge_id))
            .into_boxed();
        if let Some(user_id) = user_id {
            statement = statement.filter(awards::user_id.eq(*user_id.as_uuid()));
        }
        let rows: Vec<AwardRow> = statement
            .order_by((awards::awarded_at.desc(), awards::id.desc()))
            .select(AwardRow::as_select())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let recipient_ids: Vec<Uuid> = rows.iter().map(|row| row.user_id).collect();
        let recipients: HashMap<Uuid, ProfileRow> = profiles::table
            .filter(profiles::user_id.eq_any(&recipient_ids))
            .select(ProfileRow::as_select())
            .load::<ProfileRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .map(|row| (row.user_id, row))
            .collect();

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(profile) = recipients.get(&row.user_id).cloned() else {
                warn!(badge_id, user_id = %row.user_id, "award recipient has no profile");
                continue;
            };
            records.push(AwardRecord {
                badge_id: row.badge_id,
                user: profile_from_row(profile).summary(),
                post_id: row.post_id.map(PostId::from),
                date: row.awarded_at,
            });
        }
        Ok(records)
    }

    async fn grant(
        &self,
        badge_id: BadgeId,
        user_id: UserId,
        post_id: Option<PostId>,
        at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewAwardRow {
            badge_id,
            user_id: *user_id.as_uuid(),
            post_id: post_id.map(|id| *id.as_uuid()),
            awarded_at: at,
        };

        conn.transaction(|conn| {
            async move {
                let existing: i64 = awards::table
                    .filter(awards::badge_id.eq(row.badge_id))
                    .filter(awards::user_id.eq(row.user_id))
                    .filter(awards::post_id.is_not_distinct_from(row.post_id))
                    .count()
                    .get_result(conn)
                    .await?;
                if existing > 0 {
                    return Ok(false);
                }
                diesel::insert_into(awards::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
