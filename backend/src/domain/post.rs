//! Posts: the root entity for every kind of content.
//!
//! A thread is a top-level post plus the answers and comments pointing back to
//! it. Top-level posts have no parent and are their own root; replies always
//! carry both a parent and a root. [`NewPost`] constructors are the only way to
//! build insertable posts, which keeps that invariant out of reach of callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AuthorSummary, UserId};

/// Stable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct PostId(Uuid);

impl PostId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form; returns `None` for malformed input.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PostId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Content type of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    /// A question opening a thread.
    Question,
    /// An answer to a question.
    Answer,
    /// A comment on a post.
    Comment,
    /// A job advertisement.
    Job,
    /// A general discussion thread.
    Forum,
    /// A static page.
    Page,
    /// A blog entry.
    Blog,
    /// A tutorial.
    Tutorial,
    /// A tool announcement.
    Tool,
    /// A news item.
    News,
}

impl PostType {
    /// All types, in their stored order.
    pub const ALL: [Self; 10] = [
        Self::Question,
        Self::Answer,
        Self::Comment,
        Self::Job,
        Self::Forum,
        Self::Page,
        Self::Blog,
        Self::Tutorial,
        Self::Tool,
        Self::News,
    ];

    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Comment => "comment",
            Self::Job => "job",
            Self::Forum => "forum",
            Self::Page => "page",
            Self::Blog => "blog",
            Self::Tutorial => "tutorial",
            Self::Tool => "tool",
            Self::News => "news",
        }
    }

    /// Whether posts of this type open a thread.
    pub const fn is_toplevel(self) -> bool {
        !matches!(self, Self::Answer | Self::Comment)
    }

    /// Map a topic keyword (plural and legacy aliases included) to a
    /// top-level type.
    pub fn from_topic(keyword: &str) -> Option<Self> {
        match keyword {
            "question" | "questions" => Some(Self::Question),
            "job" | "jobs" => Some(Self::Job),
            "tutorial" | "tutorials" => Some(Self::Tutorial),
            "forum" => Some(Self::Forum),
            "blog" | "blogs" | "planet" => Some(Self::Blog),
            "tool" | "tools" => Some(Self::Tool),
            "news" => Some(Self::News),
            "page" | "pages" => Some(Self::Page),
            _ => None,
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown post type: {s}"))
    }
}

/// Open/closed lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Accepting answers.
    Open,
    /// Closed by a moderator.
    Closed,
    /// Soft deleted.
    Deleted,
}

impl PostStatus {
    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
            Self::Deleted => 2,
        }
    }

    /// Decode a stored status; unknown codes are treated as deleted.
    pub const fn from_code(code: i16) -> Self {
        match code {
            0 => Self::Open,
            1 => Self::Closed,
            _ => Self::Deleted,
        }
    }
}

/// Spam classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpamStatus {
    /// Visible content.
    NotSpam,
    /// Permanently marked as spam.
    Spam,
    /// Hidden until a moderator reviews it.
    Quarantined,
}

impl SpamStatus {
    /// Numeric code persisted in storage.
    pub const fn code(self) -> i16 {
        match self {
            Self::NotSpam => 0,
            Self::Spam => 1,
            Self::Quarantined => 2,
        }
    }

    /// Decode a stored spam state; unknown codes are treated as spam.
    pub const fn from_code(code: i16) -> Self {
        match code {
            0 => Self::NotSpam,
            2 => Self::Quarantined,
            _ => Self::Spam,
        }
    }

    /// Whether the content is hidden from the public.
    pub const fn is_hidden(self) -> bool {
        !matches!(self, Self::NotSpam)
    }
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Identifier.
    pub id: PostId,
    /// Title; replies inherit the root title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Content type.
    pub post_type: PostType,
    /// Authoring user.
    pub author_id: UserId,
    /// Direct parent for replies.
    pub parent_id: Option<PostId>,
    /// Thread root; equals `id` for top-level posts.
    pub root_id: Option<PostId>,
    /// Whether the post opens a thread.
    pub is_toplevel: bool,
    /// Lifecycle status.
    pub status: PostStatus,
    /// Spam classification.
    pub spam: SpamStatus,
    /// Number of views.
    pub view_count: i32,
    /// Number of answers in the thread.
    pub answer_count: i32,
    /// Number of answers and comments in the thread.
    pub reply_count: i32,
    /// Net upvotes.
    pub vote_count: i32,
    /// Default sort key, refreshed on edits and bumps.
    pub rank: f64,
    /// Tag names.
    pub tags: Vec<String>,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
    /// Last edit or activity time.
    pub lastedit_date: DateTime<Utc>,
}

impl Post {
    /// The thread root identifier, treating a missing root as self.
    pub fn thread_root(&self) -> PostId {
        self.root_id.unwrap_or(self.id)
    }

    /// Whether this post is the root of its thread.
    pub fn is_root(&self) -> bool {
        self.thread_root() == self.id
    }
}

/// Rank for a post touched at `at`.
pub fn rank_at(at: DateTime<Utc>) -> f64 {
    // Millisecond timestamps stay well inside the f64 mantissa.
    at.timestamp_millis() as f64 / 1000.0
}

/// A post ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    id: PostId,
    title: String,
    content: String,
    post_type: PostType,
    author_id: UserId,
    parent_id: Option<PostId>,
    root_id: PostId,
    spam: SpamStatus,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl NewPost {
    /// A top-level post; it becomes its own root.
    pub fn root(
        author_id: UserId,
        post_type: PostType,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = PostId::random();
        Self {
            id,
            title: title.into(),
            content: content.into(),
            post_type,
            author_id,
            parent_id: None,
            root_id: id,
            spam: SpamStatus::NotSpam,
            tags,
            created_at,
        }
    }

    /// A reply to `parent`, attached to the parent's thread.
    pub fn reply(
        author_id: UserId,
        post_type: PostType,
        parent: &Post,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PostId::random(),
            title: parent.title.clone(),
            content: content.into(),
            post_type,
            author_id,
            parent_id: Some(parent.id),
            root_id: parent.thread_root(),
            spam: SpamStatus::NotSpam,
            tags: Vec::new(),
            created_at,
        }
    }

    /// Start the post in the given spam state.
    pub fn with_spam(mut self, spam: SpamStatus) -> Self {
        self.spam = spam;
        self
    }

    /// Identifier the post will be stored under.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Thread root.
    pub fn root_id(&self) -> PostId {
        self.root_id
    }

    /// Direct parent, `None` for top-level posts.
    pub fn parent_id(&self) -> Option<PostId> {
        self.parent_id
    }

    /// Whether the post opens a thread.
    pub fn is_toplevel(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Materialise the stored representation.
    pub fn into_post(self) -> Post {
        let is_toplevel = self.is_toplevel();
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            post_type: self.post_type,
            author_id: self.author_id,
            parent_id: self.parent_id,
            root_id: Some(self.root_id),
            is_toplevel,
            status: PostStatus::Open,
            spam: self.spam,
            view_count: 0,
            answer_count: 0,
            reply_count: 0,
            vote_count: 0,
            rank: rank_at(self.created_at),
            tags: self.tags,
            creation_date: self.created_at,
            lastedit_date: self.created_at,
        }
    }
}

/// A post with its eagerly loaded relations.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostListing {
    /// The post.
    #[serde(flatten)]
    pub post: Post,
    /// Author summary.
    pub author: AuthorSummary,
    /// Title of the thread root, for replies.
    pub root_title: Option<String>,
}
