//! Append-only audit trail of moderation actions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{PostId, PostStatus, ProfileState, SpamStatus, UserId};

/// Number of entries shown on the moderation log page.
pub const RECENT_LOG_LIMIT: usize = 100;

/// A state change committed together with the log entry describing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationChange {
    /// Change a post's spam state.
    SetSpam { post_id: PostId, spam: SpamStatus },
    /// Change a post's lifecycle status.
    SetStatus { post_id: PostId, status: PostStatus },
    /// Move a post to the top of rank ordering.
    Bump { post_id: PostId, at: DateTime<Utc> },
    /// Change a member's moderation state.
    SetState { user_id: UserId, state: ProfileState },
    /// Add to a member's score.
    AdjustScore { user_id: UserId, delta: i32 },
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModerationLog {
    /// Moderator performing the action.
    pub actor_id: UserId,
    /// Member affected by the action.
    pub target_user_id: Option<UserId>,
    /// Post affected by the action.
    pub post_id: Option<PostId>,
    /// Free-text description.
    pub action: String,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

impl NewModerationLog {
    /// An entry about a post.
    pub fn for_post(
        actor_id: UserId,
        post_id: PostId,
        action: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id,
            target_user_id: None,
            post_id: Some(post_id),
            action: action.into(),
            created_at,
        }
    }

    /// An entry about a member.
    pub fn for_user(
        actor_id: UserId,
        target_user_id: UserId,
        action: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id,
            target_user_id: Some(target_user_id),
            post_id: None,
            action: action.into(),
            created_at,
        }
    }

    /// Record the member who authored the affected post.
    pub fn with_target(mut self, target_user_id: UserId) -> Self {
        self.target_user_id = Some(target_user_id);
        self
    }
}

/// A stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationLog {
    /// Identifier.
    pub id: i64,
    /// Moderator performing the action.
    pub actor_id: UserId,
    /// Member affected by the action.
    pub target_user_id: Option<UserId>,
    /// Post affected by the action.
    pub post_id: Option<PostId>,
    /// Free-text description.
    pub action: String,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}
