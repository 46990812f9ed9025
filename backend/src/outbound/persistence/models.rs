//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; repositories convert them
//! into domain types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    awards, badges, moderation_logs, post_tags, posts, profiles, subscriptions, task_spool, users,
    votes,
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Credential columns of the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CredentialRow {
    pub id: Uuid,
    pub password_hash: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub uid: String,
    pub name: String,
    pub state: i16,
    pub role: i16,
    pub score: i32,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub my_tags: String,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub post_type: String,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub root_id: Option<Uuid>,
    pub is_toplevel: bool,
    pub status: i16,
    pub spam: i16,
    pub view_count: i32,
    pub answer_count: i32,
    pub reply_count: i32,
    pub vote_count: i32,
    pub rank: f64,
    pub creation_date: DateTime<Utc>,
    pub lastedit_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = post_tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostTagRow {
    pub post_id: Uuid,
    pub tag: String,
}

// ---------------------------------------------------------------------------
// Votes and subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub vote_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub(crate) struct SubscriptionRow {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub kind: i16,
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BadgeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: i16,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = badges)]
pub(crate) struct NewBadgeRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub kind: i16,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = awards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AwardRow {
    pub badge_id: i64,
    pub user_id: Uuid,
    pub post_id: Option<Uuid>,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = awards)]
pub(crate) struct NewAwardRow {
    pub badge_id: i64,
    pub user_id: Uuid,
    pub post_id: Option<Uuid>,
    pub awarded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Moderation log and spool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = moderation_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ModerationLogRow {
    pub id: i64,
    pub actor_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = moderation_logs)]
pub(crate) struct NewModerationLogRow<'a> {
    pub actor_id: Uuid,
    pub target_user_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub action: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_spool)]
pub(crate) struct NewSpooledTaskRow<'a> {
    pub job_name: &'a str,
    pub payload: serde_json::Value,
}
