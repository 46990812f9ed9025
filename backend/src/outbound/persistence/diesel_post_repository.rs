//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Listings are built as boxed queries from a [`PostQuery`]; relations
//! (tags, author profiles, root titles) are loaded with one batched
//! `eq_any` query each.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::PageWindow;
use tracing::warn;
use uuid::Uuid;

use crate::domain::listing::{PostFilter, PostOrder, PostQuery, PostScope};
use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    NewPost, Post, PostId, PostListing, PostStatus, PostType, SpamStatus, SubscriptionType,
    VoteType, rank_at,
};

use super::diesel_helpers::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error, window_bounds,
};
use super::models::{PostRow, PostTagRow, ProfileRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{post_from_row, post_to_row, profile_from_row};
use super::schema::{post_tags, posts, profiles, subscriptions, votes};

/// Diesel-backed implementation of the post repository port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    map_basic_pool_error(error, PostRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    map_basic_diesel_error(error, PostRepositoryError::query, PostRepositoryError::connection)
}

fn filtered(query: &PostQuery) -> posts::BoxedQuery<'static, Pg> {
    let mut statement = posts::table.into_boxed();
    if query.scope == PostScope::Visible {
        statement = statement
            .filter(posts::is_toplevel.eq(true))
            .filter(posts::status.eq(PostStatus::Open.code()))
            .filter(posts::spam.eq(SpamStatus::NotSpam.code()));
    }

    statement = match &query.filter {
        PostFilter::None => statement,
        PostFilter::OfType(post_type) => statement.filter(posts::post_type.eq(post_type.as_str())),
        PostFilter::SpamQueue => statement.filter(
            posts::spam.eq_any([SpamStatus::Spam.code(), SpamStatus::Quarantined.code()]),
        ),
        PostFilter::Unanswered => statement
            .filter(posts::post_type.eq(PostType::Question.as_str()))
            .filter(posts::answer_count.eq(0)),
        PostFilter::BookmarkedBy(user_id) => statement.filter(
            posts::id.eq_any(
                votes::table
                    .filter(votes::user_id.eq(*user_id.as_uuid()))
                    .filter(votes::vote_type.eq(VoteType::Bookmark.as_str()))
                    .select(votes::post_id),
            ),
        ),
        PostFilter::FollowedBy(user_id) => statement.filter(
            posts::id.eq_any(
                subscriptions::table
                    .filter(subscriptions::user_id.eq(*user_id.as_uuid()))
                    .filter(subscriptions::kind.ne(SubscriptionType::NoMessages.code()))
                    .select(subscriptions::post_id),
            ),
        ),
        PostFilter::AuthoredBy(user_id) => statement.filter(posts::author_id.eq(*user_id.as_uuid())),
        PostFilter::VotedBy(user_id) => statement.filter(
            posts::id.eq_any(
                votes::table
                    .filter(votes::user_id.eq(*user_id.as_uuid()))
                    .filter(votes::vote_type.ne(VoteType::Bookmark.as_str()))
                    .select(votes::post_id),
            ),
        ),
        PostFilter::TaggedAny(tags) => statement.filter(
            posts::id.eq_any(
                post_tags::table
                    .filter(post_tags::tag.eq_any(tags.clone()))
                    .select(post_tags::post_id),
            ),
        ),
    };

    if let Some(after) = query.edited_after {
        statement = statement.filter(posts::lastedit_date.gt(after));
    }
    statement
}

fn ordered(
    statement: posts::BoxedQuery<'static, Pg>,
    order: PostOrder,
) -> posts::BoxedQuery<'static, Pg> {
    match order {
        PostOrder::Rank => statement.order_by((posts::rank.desc(), posts::id.desc())),
        PostOrder::Views => statement.order_by((posts::view_count.desc(), posts::id.desc())),
        PostOrder::Replies => statement.order_by((posts::reply_count.desc(), posts::id.desc())),
        PostOrder::Votes => statement.order_by((posts::vote_count.desc(), posts::id.desc())),
        PostOrder::Creation => statement.order_by((posts::creation_date.desc(), posts::id.desc())),
        PostOrder::Activity => statement.order_by((posts::lastedit_date.desc(), posts::id.desc())),
    }
}

async fn load_tags(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<String>>, PostRepositoryError> {
    let rows: Vec<PostTagRow> = post_tags::table
        .filter(post_tags::post_id.eq_any(ids))
        .select(PostTagRow::as_select())
        .order_by((post_tags::post_id, post_tags::tag))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut tags: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        tags.entry(row.post_id).or_default().push(row.tag);
    }
    Ok(tags)
}

/// Attach tags, author summaries and root titles to `rows`, keeping order.
async fn attach_relations(
    conn: &mut AsyncPgConnection,
    rows: Vec<PostRow>,
) -> Result<Vec<PostListing>, PostRepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let author_ids: Vec<Uuid> = rows.iter().map(|row| row.author_id).collect();
    let root_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|row| row.root_id.filter(|root| *root != row.id))
        .collect();

    let mut tags = load_tags(conn, &ids).await?;
    let authors: HashMap<Uuid, ProfileRow> = profiles::table
        .filter(profiles::user_id.eq_any(&author_ids))
        .select(ProfileRow::as_select())
        .load::<ProfileRow>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|row| (row.user_id, row))
        .collect();
    let root_titles: HashMap<Uuid, String> = if root_ids.is_empty() {
        HashMap::new()
    } else {
        posts::table
            .filter(posts::id.eq_any(&root_ids))
            .select((posts::id, posts::title))
            .load::<(Uuid, String)>(conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect()
    };

    let mut listings = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(author) = authors.get(&row.author_id).cloned() else {
            warn!(post_id = %row.id, author_id = %row.author_id, "post author has no profile");
            continue;
        };
        let root_title = row.root_id.and_then(|root| root_titles.get(&root).cloned());
        let post_tags = tags.remove(&row.id).unwrap_or_default();
        listings.push(PostListing {
            post: post_from_row(row, post_tags),
            author: profile_from_row(author).summary(),
            root_title,
        });
    }
    Ok(listings)
}

async fn update_counters(
    conn: &mut AsyncPgConnection,
    root_id: Uuid,
    is_answer: bool,
    at: DateTime<Utc>,
) -> Result<(), diesel::result::Error> {
    let answer_increment = i32::from(is_answer);
    diesel::update(posts::table.filter(posts::id.eq(root_id)))
        .set((
            posts::reply_count.eq(posts::reply_count + 1),
            posts::answer_count.eq(posts::answer_count + answer_increment),
            posts::lastedit_date.eq(at),
            posts::rank.eq(rank_at(at)),
        ))
        .execute(conn)
        .await
        .map(|_| ())
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn count(&self, query: &PostQuery) -> Result<u64, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(total))
    }

    async fn list(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<PostListing>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = window_bounds(window);
        let rows: Vec<PostRow> = ordered(filtered(query), query.order)
            .select(PostRow::as_select())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_relations(&mut conn, rows).await
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PostRow> = posts::table
            .filter(posts::id.eq(*id.as_uuid()))
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut tags = load_tags(&mut conn, &[row.id]).await?;
        let post_tags = tags.remove(&row.id).unwrap_or_default();
        Ok(Some(post_from_row(row, post_tags)))
    }

    async fn thread(&self, root_id: PostId) -> Result<Vec<PostListing>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PostRow> = posts::table
            .filter(posts::root_id.eq(*root_id.as_uuid()))
            .select(PostRow::as_select())
            .order_by((posts::creation_date.asc(), posts::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_relations(&mut conn, rows).await
    }

    async fn listings_by_ids(&self, ids: &[PostId]) -> Result<Vec<PostListing>, PostRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<PostRow> = posts::table
            .filter(posts::id.eq_any(&uuids))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_relations(&mut conn, rows).await
    }

    async fn insert(&self, post: NewPost) -> Result<Post, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post = post.into_post();
        let row = post_to_row(&post);
        let tag_rows: Vec<PostTagRow> = post
            .tags
            .iter()
            .map(|tag| PostTagRow {
                post_id: row.id,
                tag: tag.clone(),
            })
            .collect();
        let reply_root = post.root_id.filter(|_| !post.is_toplevel).map(|id| *id.as_uuid());
        let is_answer = post.post_type == PostType::Answer;
        let created = post.creation_date;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(posts::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !tag_rows.is_empty() {
                    diesel::insert_into(post_tags::table)
                        .values(&tag_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                if let Some(root_id) = reply_root {
                    update_counters(conn, root_id, is_answer, created).await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;

        Ok(post)
    }

    async fn increment_views(&self, id: PostId) -> Result<i32, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(posts::table.filter(posts::id.eq(*id.as_uuid())))
            .set(posts::view_count.eq(posts::view_count + 1))
            .returning(posts::view_count)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn adjust_votes(&self, id: PostId, delta: i32) -> Result<i32, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(posts::table.filter(posts::id.eq(*id.as_uuid())))
            .set(posts::vote_count.eq(posts::vote_count + delta))
            .returning(posts::vote_count)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
