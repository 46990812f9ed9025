//! PostgreSQL-backed `ProfileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageWindow;

use crate::domain::community::{CommunityOrder, CommunityQuery};
use crate::domain::ports::{
    NewAccount, ProfileRepository, ProfileRepositoryError, StoredCredentials,
};
use crate::domain::{Profile, ProfileUid, UserId};

use super::diesel_helpers::{
    count_to_u64, is_unique_violation, map_basic_diesel_error, map_basic_pool_error, window_bounds,
};
use super::models::{CredentialRow, NewUserRow, ProfileRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{profile_from_row, profile_to_row};
use super::schema::{profiles, users};

/// Diesel-backed implementation of the profile repository port.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProfileRepositoryError {
    map_basic_pool_error(error, ProfileRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProfileRepositoryError {
    if is_unique_violation(&error) {
        return ProfileRepositoryError::duplicate("username or email is taken");
    }
    map_basic_diesel_error(
        error,
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

fn community(query: &CommunityQuery) -> profiles::BoxedQuery<'static, Pg> {
    let listed: Vec<i16> = CommunityQuery::LISTED_STATES
        .iter()
        .map(|state| state.code())
        .collect();
    let mut statement = profiles::table
        .into_boxed()
        .filter(profiles::state.eq_any(listed));
    if let Some(since) = query.active_since {
        statement = statement.filter(profiles::last_login.gt(since));
    }
    if let Some(text) = &query.text {
        statement = statement.filter(profiles::name.ilike(format!("%{text}%")));
    }
    statement
}

fn community_ordered(
    statement: profiles::BoxedQuery<'static, Pg>,
    order: CommunityOrder,
) -> profiles::BoxedQuery<'static, Pg> {
    match order {
        CommunityOrder::Visit => statement.order_by((
            profiles::last_login.desc().nulls_last(),
            profiles::user_id.desc(),
        )),
        CommunityOrder::Reputation => {
            statement.order_by((profiles::score.desc(), profiles::user_id.desc()))
        }
        CommunityOrder::Joined => {
            statement.order_by((profiles::date_joined.desc(), profiles::user_id.desc()))
        }
    }
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn create_account(&self, account: NewAccount) -> Result<Profile, ProfileRepositoryError> {
        let profile_row = profile_to_row(&account.profile);
        let NewAccount {
            username,
            email,
            password_hash,
            profile,
        } = account;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(NewUserRow {
                        id: profile_row.user_id,
                        username: &username,
                        email: email.as_str(),
                        password_hash: &password_hash,
                    })
                    .execute(conn)
                    .await?;
                diesel::insert_into(profiles::table)
                    .values(&profile_row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;

        Ok(profile)
    }

    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let login = login.trim().to_lowercase();
        let row: Option<CredentialRow> = users::table
            .filter(users::username.eq(&login).or(users::email.eq(&login)))
            .select(CredentialRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(|row| StoredCredentials {
            user_id: UserId::from(row.id),
            password_hash: row.password_hash,
        }))
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        profiles::table
            .filter(profiles::user_id.eq(*user_id.as_uuid()))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(profile_from_row))
            .map_err(map_diesel_error)
    }

    async fn find_by_uid(&self, uid: &ProfileUid) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        profiles::table
            .filter(profiles::uid.eq(uid.as_str()))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(profile_from_row))
            .map_err(map_diesel_error)
    }

    async fn adjust_score(&self, user_id: UserId, delta: i32) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(*user_id.as_uuid())))
            .set(profiles::score.eq(profiles::score + delta))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn touch_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(*user_id.as_uuid())))
            .set(profiles::last_login.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_details(
        &self,
        user_id: UserId,
        name: &str,
        my_tags: &str,
    ) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(*user_id.as_uuid())))
            .set((profiles::name.eq(name), profiles::my_tags.eq(my_tags)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn count_community(&self, query: &CommunityQuery) -> Result<u64, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = community(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(total))
    }

    async fn list_community(
        &self,
        query: &CommunityQuery,
        window: PageWindow,
    ) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = window_bounds(window);
        let rows: Vec<ProfileRow> = community_ordered(community(query), query.order)
            .select(ProfileRow::as_select())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(profile_from_row).collect())
    }
}
