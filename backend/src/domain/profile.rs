//! Member profiles, roles and moderation states.
//!
//! Every user owns exactly one [`Profile`], created alongside the account.
//! The profile carries the public short identifier used in URLs, the
//! moderation state driven by [`crate::domain::ModerationService`] and the
//! reputation score.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Length of a profile short identifier.
pub const PROFILE_UID_LEN: usize = 8;

/// Public short identifier of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "1a2b3c4d")]
pub struct ProfileUid(String);

impl ProfileUid {
    /// Derive a fresh identifier from a random UUID.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple.chars().take(PROFILE_UID_LEN).collect())
    }

    /// Wrap an existing identifier; blank input is rejected.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moderation state of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    /// Freshly registered member.
    New,
    /// Member in good standing.
    Trusted,
    /// Temporarily prevented from posting.
    Suspended,
    /// Permanently excluded.
    Banned,
}

impl ProfileState {
    /// All states, in their stored order.
    pub const ALL: [Self; 4] = [Self::New, Self::Trusted, Self::Suspended, Self::Banned];

    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::New => 1,
            Self::Trusted => 2,
            Self::Suspended => 3,
            Self::Banned => 4,
        }
    }

    /// Decode a stored state.
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    /// Human readable label used in moderation log entries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Trusted => "Active",
            Self::Suspended => "Suspended",
            Self::Banned => "Banned",
        }
    }

    /// Whether members in this state may still take part.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::New | Self::Trusted)
    }
}

/// Error returned when parsing an unknown profile state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown profile state: {0}")]
pub struct UnknownProfileState(pub String);

impl FromStr for ProfileState {
    type Err = UnknownProfileState;

    /// Accepts the numeric code or the case-insensitive name (`active` is an
    /// alias for `trusted`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if let Ok(code) = value.parse::<i16>() {
            return Self::from_code(code).ok_or_else(|| UnknownProfileState(s.to_owned()));
        }
        match value.as_str() {
            "new" => Ok(Self::New),
            "trusted" | "active" => Ok(Self::Trusted),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            _ => Err(UnknownProfileState(s.to_owned())),
        }
    }
}

/// Role granting moderation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ordinary member.
    Regular,
    /// Can moderate posts and members.
    Moderator,
    /// Moderator who may also moderate other moderators.
    Manager,
}

impl Role {
    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::Regular => 0,
            Self::Moderator => 1,
            Self::Manager => 2,
        }
    }

    /// Decode a stored role; unknown codes degrade to [`Role::Regular`].
    pub const fn from_code(code: i16) -> Self {
        match code {
            1 => Self::Moderator,
            2 => Self::Manager,
            _ => Self::Regular,
        }
    }
}

/// Per-user metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Owning user.
    pub user_id: UserId,
    /// Public short identifier.
    pub uid: ProfileUid,
    /// Display name.
    pub name: String,
    /// Moderation state.
    pub state: ProfileState,
    /// Capability role.
    pub role: Role,
    /// Reputation score.
    pub score: i32,
    /// Most recent successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Date the account was created.
    pub date_joined: DateTime<Utc>,
    /// Comma-separated tags the member follows.
    pub my_tags: String,
}

impl Profile {
    /// Build the profile of a newly registered member.
    pub fn new_member(user_id: UserId, name: impl Into<String>, joined: DateTime<Utc>) -> Self {
        Self {
            user_id,
            uid: ProfileUid::generate(),
            name: name.into(),
            state: ProfileState::New,
            role: Role::Regular,
            score: 0,
            last_login: None,
            date_joined: joined,
            my_tags: String::new(),
        }
    }

    /// Whether the member holds moderation rights.
    pub const fn is_moderator(&self) -> bool {
        matches!(self.role, Role::Moderator | Role::Manager)
    }

    /// Whether the member may moderate other moderators.
    pub const fn is_manager(&self) -> bool {
        matches!(self.role, Role::Manager)
    }

    /// Whether the member's reputation is below `threshold`.
    ///
    /// Moderators are never considered low reputation.
    pub const fn is_low_rep(&self, threshold: i32) -> bool {
        !self.is_moderator() && self.score < threshold
    }

    /// Saved tags, lowercased and trimmed with blanks and duplicates removed.
    pub fn saved_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.my_tags.split(',') {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Compact author view embedded in listings.
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            user_id: self.user_id,
            uid: self.uid.clone(),
            name: self.name.clone(),
            score: self.score,
            role: self.role,
        }
    }
}

/// Author details eagerly loaded alongside posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    /// Author account.
    pub user_id: UserId,
    /// Public short identifier.
    pub uid: ProfileUid,
    /// Display name.
    pub name: String,
    /// Reputation score.
    pub score: i32,
    /// Capability role.
    pub role: Role,
}

/// The party making a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewer {
    /// No session.
    Anonymous,
    /// Logged-in member.
    Member(Profile),
}

impl Viewer {
    /// The member profile, if authenticated.
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Anonymous => None,
            Self::Member(profile) => Some(profile),
        }
    }

    /// Whether the viewer is a logged-in moderator.
    pub fn is_moderator(&self) -> bool {
        self.profile().is_some_and(Profile::is_moderator)
    }
}
