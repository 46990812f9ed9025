//! Conversions from Diesel rows into domain entities.

use tracing::warn;

use crate::domain::{
    Badge, BadgeKind, ModerationLog, Post, PostId, PostStatus, PostType, Profile, ProfileState,
    ProfileUid, Role, SpamStatus, UserId,
};

use super::models::{BadgeRow, ModerationLogRow, PostRow, ProfileRow};

pub(crate) fn profile_from_row(row: ProfileRow) -> Profile {
    let state = ProfileState::from_code(row.state).unwrap_or_else(|| {
        warn!(value = row.state, user_id = %row.user_id, "unrecognised profile state, defaulting to New");
        ProfileState::New
    });
    let uid = ProfileUid::new(&row.uid).unwrap_or_else(|| {
        warn!(user_id = %row.user_id, "blank profile uid, generating one for display");
        ProfileUid::generate()
    });
    Profile {
        user_id: UserId::from(row.user_id),
        uid,
        name: row.name,
        state,
        role: Role::from_code(row.role),
        score: row.score,
        last_login: row.last_login,
        date_joined: row.date_joined,
        my_tags: row.my_tags,
    }
}

pub(crate) fn profile_to_row(profile: &Profile) -> ProfileRow {
    ProfileRow {
        user_id: *profile.user_id.as_uuid(),
        uid: profile.uid.as_str().to_owned(),
        name: profile.name.clone(),
        state: profile.state.code(),
        role: profile.role.code(),
        score: profile.score,
        last_login: profile.last_login,
        date_joined: profile.date_joined,
        my_tags: profile.my_tags.clone(),
    }
}

pub(crate) fn post_from_row(row: PostRow, tags: Vec<String>) -> Post {
    let post_type = row.post_type.parse::<PostType>().unwrap_or_else(|_| {
        warn!(value = %row.post_type, post_id = %row.id, "unrecognised post type, defaulting to forum");
        PostType::Forum
    });
    Post {
        id: PostId::from(row.id),
        title: row.title,
        content: row.content,
        post_type,
        author_id: UserId::from(row.author_id),
        parent_id: row.parent_id.map(PostId::from),
        root_id: row.root_id.map(PostId::from),
        is_toplevel: row.is_toplevel,
        status: PostStatus::from_code(row.status),
        spam: SpamStatus::from_code(row.spam),
        view_count: row.view_count,
        answer_count: row.answer_count,
        reply_count: row.reply_count,
        vote_count: row.vote_count,
        rank: row.rank,
        tags,
        creation_date: row.creation_date,
        lastedit_date: row.lastedit_date,
    }
}

pub(crate) fn post_to_row(post: &Post) -> PostRow {
    PostRow {
        id: *post.id.as_uuid(),
        title: post.title.clone(),
        content: post.content.clone(),
        post_type: post.post_type.as_str().to_owned(),
        author_id: *post.author_id.as_uuid(),
        parent_id: post.parent_id.map(|id| *id.as_uuid()),
        root_id: post.root_id.map(|id| *id.as_uuid()),
        is_toplevel: post.is_toplevel,
        status: post.status.code(),
        spam: post.spam.code(),
        view_count: post.view_count,
        answer_count: post.answer_count,
        reply_count: post.reply_count,
        vote_count: post.vote_count,
        rank: post.rank,
        creation_date: post.creation_date,
        lastedit_date: post.lastedit_date,
    }
}

pub(crate) fn badge_from_row(row: BadgeRow) -> Badge {
    Badge {
        id: row.id,
        name: row.name,
        description: row.description,
        icon: row.icon,
        kind: BadgeKind::from_code(row.kind),
    }
}

pub(crate) fn log_from_row(row: ModerationLogRow) -> ModerationLog {
    ModerationLog {
        id: row.id,
        actor_id: UserId::from(row.actor_id),
        target_user_id: row.target_user_id.map(UserId::from),
        post_id: row.post_id.map(PostId::from),
        action: row.action,
        created_at: row.created_at,
    }
}
