//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Login identities.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Public member profiles, one per user.
    profiles (user_id) {
        user_id -> Uuid,
        uid -> Varchar,
        name -> Varchar,
        state -> Int2,
        role -> Int2,
        score -> Int4,
        last_login -> Nullable<Timestamptz>,
        date_joined -> Timestamptz,
        my_tags -> Text,
    }
}

diesel::table! {
    /// Every kind of post; replies point at a parent and a thread root.
    posts (id) {
        id -> Uuid,
        title -> Varchar,
        content -> Text,
        post_type -> Varchar,
        author_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        root_id -> Nullable<Uuid>,
        is_toplevel -> Bool,
        status -> Int2,
        spam -> Int2,
        view_count -> Int4,
        answer_count -> Int4,
        reply_count -> Int4,
        vote_count -> Int4,
        rank -> Float8,
        creation_date -> Timestamptz,
        lastedit_date -> Timestamptz,
    }
}

diesel::table! {
    /// Tag names attached to posts.
    post_tags (post_id, tag) {
        post_id -> Uuid,
        tag -> Varchar,
    }
}

diesel::table! {
    /// Votes, unique per member, post and kind.
    votes (user_id, post_id, vote_type) {
        user_id -> Uuid,
        post_id -> Uuid,
        vote_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Thread subscriptions.
    subscriptions (user_id, post_id) {
        user_id -> Uuid,
        post_id -> Uuid,
        kind -> Int2,
    }
}

diesel::table! {
    /// Badge catalogue, seeded at startup.
    badges (id) {
        id -> Int8,
        name -> Varchar,
        description -> Varchar,
        icon -> Varchar,
        kind -> Int2,
    }
}

diesel::table! {
    /// Badges granted to members.
    awards (id) {
        id -> Int8,
        badge_id -> Int8,
        user_id -> Uuid,
        post_id -> Nullable<Uuid>,
        awarded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only moderation audit trail.
    moderation_logs (id) {
        id -> Int8,
        actor_id -> Uuid,
        target_user_id -> Nullable<Uuid>,
        post_id -> Nullable<Uuid>,
        action -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Serialized jobs waiting for the external spooler.
    task_spool (id) {
        id -> Int8,
        job_name -> Varchar,
        payload -> Jsonb,
        enqueued_at -> Timestamptz,
    }
}

diesel::joinable!(profiles -> users (user_id));
diesel::joinable!(post_tags -> posts (post_id));
diesel::joinable!(votes -> posts (post_id));
diesel::joinable!(subscriptions -> posts (post_id));
diesel::joinable!(awards -> badges (badge_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    profiles,
    posts,
    post_tags,
    votes,
    subscriptions,
    badges,
    awards,
    moderation_logs,
    task_spool,
);
