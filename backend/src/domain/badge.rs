//! Badges and the awards granting them.
//!
//! Award definitions are an immutable list compiled into the binary and passed
//! explicitly to [`crate::domain::seed_badges`] at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthorSummary, PostId};

/// Badge rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    /// Common achievement.
    Bronze,
    /// Uncommon achievement.
    Silver,
    /// Rare achievement.
    Gold,
}

impl BadgeKind {
    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 1,
            Self::Gold => 2,
        }
    }

    /// Decode a stored tier.
    pub const fn from_code(code: i16) -> Self {
        match code {
            1 => Self::Silver,
            2 => Self::Gold,
            _ => Self::Bronze,
        }
    }
}

/// Static description of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardDefinition {
    /// Unique badge name.
    pub name: &'static str,
    /// Description shown on the badge page.
    pub description: &'static str,
    /// Icon class.
    pub icon: &'static str,
    /// Rarity tier.
    pub kind: BadgeKind,
}

/// Every award the site knows about.
pub const AWARD_DEFINITIONS: &[AwardDefinition] = &[
    AwardDefinition {
        name: "Autobiographer",
        description: "has more than 80 characters in the information field of the user's profile",
        icon: "bullhorn icon",
        kind: BadgeKind::Bronze,
    },
    AwardDefinition {
        name: "Student",
        description: "asked a question with at least 3 up-votes",
        icon: "certificate icon",
        kind: BadgeKind::Bronze,
    },
    AwardDefinition {
        name: "Teacher",
        description: "created an answer with at least 3 up-votes",
        icon: "smile icon",
        kind: BadgeKind::Bronze,
    },
    AwardDefinition {
        name: "Commentator",
        description: "created a comment with at least 3 up-votes",
        icon: "comment icon",
        kind: BadgeKind::Bronze,
    },
    AwardDefinition {
        name: "Supporter",
        description: "voted at least 25 times",
        icon: "thumbs up icon",
        kind: BadgeKind::Silver,
    },
    AwardDefinition {
        name: "Scholar",
        description: "created an answer that has been accepted",
        icon: "university icon",
        kind: BadgeKind::Silver,
    },
    AwardDefinition {
        name: "Popular Question",
        description: "created a question with more than 1,000 views",
        icon: "eye icon",
        kind: BadgeKind::Gold,
    },
    AwardDefinition {
        name: "Guru",
        description: "received more than 100 upvotes",
        icon: "beer icon",
        kind: BadgeKind::Gold,
    },
];

/// Stored badge identifier.
pub type BadgeId = i64;

/// A persisted badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Identifier.
    pub id: BadgeId,
    /// Unique name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Icon class.
    pub icon: String,
    /// Rarity tier.
    pub kind: BadgeKind,
}

/// Badge together with how many times it was awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeWithCount {
    /// The badge.
    #[serde(flatten)]
    pub badge: Badge,
    /// Number of awards granted.
    pub award_count: u64,
}

/// A granted award with its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwardRecord {
    /// Badge granted.
    pub badge_id: BadgeId,
    /// Recipient.
    pub user: AuthorSummary,
    /// Post that earned the award, if any.
    pub post_id: Option<PostId>,
    /// When the award was granted.
    pub date: DateTime<Utc>,
}
