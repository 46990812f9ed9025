//! Votes and thread subscriptions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PostId, UserId};

/// Kind of vote a member can cast on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// Endorses the post and rewards its author.
    Upvote,
    /// Saves the post to the member's bookmarks.
    Bookmark,
    /// Marks an answer as accepted by the question author.
    Accept,
}

impl VoteType {
    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Bookmark => "bookmark",
            Self::Accept => "accept",
        }
    }

    /// Reputation change applied to the post author when the vote is added.
    pub const fn score_delta(self) -> i32 {
        match self {
            Self::Upvote | Self::Accept => 1,
            Self::Bookmark => 0,
        }
    }
}

impl FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upvote" | "vote" => Ok(Self::Upvote),
            "bookmark" => Ok(Self::Bookmark),
            "accept" => Ok(Self::Accept),
            other => Err(format!("unknown vote type: {other}")),
        }
    }
}

/// A recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Voting member.
    pub user_id: UserId,
    /// Target post.
    pub post_id: PostId,
    /// Vote kind.
    pub vote_type: VoteType,
    /// When the vote was cast.
    pub date: DateTime<Utc>,
}

/// Result of toggling a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteToggle {
    /// The vote was recorded.
    Added,
    /// An existing identical vote was withdrawn.
    Removed,
}

/// Notification preference for a followed thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    /// Notify on the site only.
    Local,
    /// Notify by email.
    Email,
    /// Keep the subscription but suppress every notification.
    NoMessages,
}

impl SubscriptionType {
    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::Local => 0,
            Self::Email => 1,
            Self::NoMessages => 2,
        }
    }

    /// Decode a stored subscription type.
    pub const fn from_code(code: i16) -> Self {
        match code {
            1 => Self::Email,
            2 => Self::NoMessages,
            _ => Self::Local,
        }
    }
}
