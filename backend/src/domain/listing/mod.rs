//! Post listing query construction.
//!
//! A listing request names a topic, an ordering and a time window. Parsing
//! turns those keywords into a [`PostQuery`]: a plain value describing which
//! posts to fetch and in what order. Repositories translate the query to
//! their backend; nothing here touches storage.

mod service;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::authorization::AccessDenied;
use super::{PostType, UserId, Viewer};

pub use service::{ListingPage, ListingRequest, PostListingService, cache_key};

/// Named filter applied to the post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Every visible post.
    Latest,
    /// Posts of a single content type.
    Type(PostType),
    /// Moderator review queue.
    Spam,
    /// Unanswered questions.
    Open,
    /// Posts the viewer bookmarked.
    Bookmarks,
    /// Threads the viewer follows.
    Following,
    /// Everything the viewer wrote.
    MyPosts,
    /// Posts the viewer voted on.
    MyVotes,
    /// Posts tagged with the viewer's saved tags.
    MyTags,
    /// Posts carrying a tag.
    Tag(String),
}

impl Topic {
    /// Parse a topic keyword; matching is case-insensitive and anything
    /// unrecognised is a tag name.
    pub fn parse(raw: &str) -> Self {
        let keyword = raw.trim().to_lowercase();
        if keyword.is_empty() || keyword == "latest" {
            return Self::Latest;
        }
        if let Some(post_type) = PostType::from_topic(&keyword) {
            return Self::Type(post_type);
        }
        match keyword.as_str() {
            "spam" => Self::Spam,
            "open" | "unanswered" => Self::Open,
            "bookmarks" => Self::Bookmarks,
            "following" => Self::Following,
            "myposts" | "my-posts" | "my posts" => Self::MyPosts,
            "myvotes" | "my-votes" | "my votes" => Self::MyVotes,
            "mytags" | "my-tags" | "my tags" => Self::MyTags,
            _ => Self::Tag(keyword),
        }
    }

    /// Canonical keyword, used in cache keys and URLs.
    pub fn keyword(&self) -> String {
        match self {
            Self::Latest => "latest".to_owned(),
            Self::Type(post_type) => post_type.as_str().to_owned(),
            Self::Spam => "spam".to_owned(),
            Self::Open => "open".to_owned(),
            Self::Bookmarks => "bookmarks".to_owned(),
            Self::Following => "following".to_owned(),
            Self::MyPosts => "myposts".to_owned(),
            Self::MyVotes => "myvotes".to_owned(),
            Self::MyTags => "mytags".to_owned(),
            Self::Tag(tag) => tag.clone(),
        }
    }

    /// Whether the topic depends on who is asking.
    pub const fn is_personal(&self) -> bool {
        matches!(
            self,
            Self::Bookmarks | Self::Following | Self::MyPosts | Self::MyVotes | Self::MyTags
        )
    }
}

/// Sort expression for listings; every ordering is descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrder {
    /// Derived rank.
    #[default]
    Rank,
    /// View count.
    Views,
    /// Reply count.
    Replies,
    /// Vote count.
    Votes,
    /// Creation time.
    Creation,
    /// Last edit time.
    Activity,
}

impl PostOrder {
    /// Map an ordering keyword; unknown or missing keywords yield rank.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("views") => Self::Views,
            Some("replies" | "answers") => Self::Replies,
            Some("votes") => Self::Votes,
            Some("creation" | "date") => Self::Creation,
            Some("activity" | "edit") => Self::Activity,
            _ => Self::Rank,
        }
    }

    /// Canonical keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Views => "views",
            Self::Replies => "replies",
            Self::Votes => "votes",
            Self::Creation => "creation",
            Self::Activity => "activity",
        }
    }
}

/// Recency filter expressed in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// No time filter.
    #[default]
    All,
    /// Edited in the last day.
    Today,
    /// Edited in the last 7 days.
    Week,
    /// Edited in the last 30 days.
    Month,
    /// Edited in the last 365 days.
    Year,
}

impl TimeWindow {
    /// Map a window keyword; unknown or missing keywords yield no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("today") => Self::Today,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("year") => Self::Year,
            _ => Self::All,
        }
    }

    /// Number of days covered; zero means unbounded.
    pub const fn days(self) -> i64 {
        match self {
            Self::All => 0,
            Self::Today => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// Canonical keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Lower bound on `lastedit_date`, if any.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.days() {
            0 => None,
            days => Some(now - Duration::days(days)),
        }
    }
}

/// Which posts a query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Open, non-spam, top-level posts.
    Visible,
    /// Any post regardless of status, spam state or depth.
    Everything,
}

/// Topic-specific predicate applied on top of the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// No extra predicate.
    None,
    /// Content type equals.
    OfType(PostType),
    /// Spam state is spam or quarantined.
    SpamQueue,
    /// Questions without answers.
    Unanswered,
    /// Bookmarked by the user.
    BookmarkedBy(UserId),
    /// Subscribed to by the user, excluding muted subscriptions.
    FollowedBy(UserId),
    /// Written by the user.
    AuthoredBy(UserId),
    /// Voted on by the user.
    VotedBy(UserId),
    /// Tagged with at least one of the tags.
    TaggedAny(Vec<String>),
}

/// Storage-independent description of a post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Starting set.
    pub scope: PostScope,
    /// Topic predicate.
    pub filter: PostFilter,
    /// Sort expression.
    pub order: PostOrder,
    /// Only posts edited strictly after this instant.
    pub edited_after: Option<DateTime<Utc>>,
}

impl PostQuery {
    /// Visible posts with no extra filter.
    pub fn visible() -> Self {
        Self {
            scope: PostScope::Visible,
            filter: PostFilter::None,
            order: PostOrder::Rank,
            edited_after: None,
        }
    }

    /// Build the query for `topic` as seen by `viewer`.
    ///
    /// The spam queue is restricted to moderators. Personal topics requested
    /// by an anonymous viewer fall back to the visible set.
    pub fn for_topic(
        topic: &Topic,
        viewer: &Viewer,
        order: PostOrder,
        edited_after: Option<DateTime<Utc>>,
    ) -> Result<Self, AccessDenied> {
        let member = viewer.profile();
        let (scope, filter) = match (topic, member) {
            (Topic::Latest, _) => (PostScope::Visible, PostFilter::None),
            (Topic::Type(post_type), _) => (PostScope::Visible, PostFilter::OfType(*post_type)),
            (Topic::Spam, _) if viewer.is_moderator() => {
                (PostScope::Everything, PostFilter::SpamQueue)
            }
            (Topic::Spam, _) => return Err(AccessDenied::ModeratorRequired),
            (Topic::Open, _) => (PostScope::Visible, PostFilter::Unanswered),
            (Topic::Bookmarks, Some(profile)) => {
                (PostScope::Everything, PostFilter::BookmarkedBy(profile.user_id))
            }
            (Topic::Following, Some(profile)) => {
                (PostScope::Visible, PostFilter::FollowedBy(profile.user_id))
            }
            (Topic::MyPosts, Some(profile)) => {
                (PostScope::Everything, PostFilter::AuthoredBy(profile.user_id))
            }
            (Topic::MyVotes, Some(profile)) => {
                (PostScope::Visible, PostFilter::VotedBy(profile.user_id))
            }
            (Topic::MyTags, Some(profile)) => {
                (PostScope::Visible, PostFilter::TaggedAny(profile.saved_tags()))
            }
            (
                Topic::Bookmarks | Topic::Following | Topic::MyPosts | Topic::MyVotes | Topic::MyTags,
                None,
            ) => (PostScope::Visible, PostFilter::None),
            (Topic::Tag(tag), _) => (PostScope::Visible, PostFilter::TaggedAny(vec![tag.clone()])),
        };
        Ok(Self {
            scope,
            filter,
            order,
            edited_after,
        })
    }
}
