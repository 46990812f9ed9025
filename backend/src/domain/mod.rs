//! Domain primitives, services and ports.
//!
//! Purpose: define the forum's entities and use-cases independently of HTTP,
//! storage and background execution. Services depend only on the traits in
//! [`ports`]; adapters live under `crate::outbound`.
//!
//! Public surface:
//! - [`Error`]: the API error payload shared by every service.
//! - Entities: posts, profiles, votes, badges and the moderation log.
//! - Services: listing, pagination, moderation, posting, awards, tags,
//!   search, community and accounts.

pub mod accounts;
pub mod auth;
pub mod authorization;
pub mod awards;
pub mod badge;
pub mod cached_pagination;
pub mod community;
pub mod demo_content;
pub mod error;
pub mod forms;
pub mod listing;
pub mod moderation;
pub mod moderation_log;
pub mod navigation;
mod port_error_mapping;
pub mod ports;
pub mod post;
pub mod posting;
pub mod profile;
pub mod search;
pub mod tags;
pub mod tasks;
pub mod trace_id;
pub mod user;
pub mod vote;

pub use self::accounts::{AccountService, ProfileForm, SignupForm, validate_profile_form};
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN, SignupRequest, validate_signup,
};
pub use self::authorization::{
    AccessDenied, require_active_member, require_member, require_moderator,
};
pub use self::awards::{BadgeDetail, BadgeService, seed_badges};
pub use self::badge::{
    AWARD_DEFINITIONS, AwardDefinition, AwardRecord, Badge, BadgeId, BadgeKind, BadgeWithCount,
};
pub use self::cached_pagination::{CachedPaginator, DEFAULT_COUNT_TTL};
pub use self::community::{CommunityOrder, CommunityQuery, CommunityRequest, CommunityService};
pub use self::demo_content::{AdminAccount, DemoContentPorts, WELCOME_POSTS, seed_demo_content};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::forms::{FormErrors, form_messages};
pub use self::listing::{ListingPage, ListingRequest, PostListingService, PostQuery, Topic};
pub use self::moderation::{
    ModerationService, PostModerationForm, ReputationPolicy, UserModerationForm,
};
pub use self::moderation_log::{
    ModerationChange, ModerationLog, NewModerationLog, RECENT_LOG_LIMIT,
};
pub use self::navigation::NextPage;
pub use self::post::{
    NewPost, Post, PostId, PostListing, PostStatus, PostType, SpamStatus, rank_at,
};
pub use self::posting::{
    AnswerForm, PostForm, PostingPorts, PostingService, Thread, ThreadLookup, VoteOutcome,
};
pub use self::profile::{
    AuthorSummary, Profile, ProfileState, ProfileUid, Role, UnknownProfileState, Viewer,
};
pub use self::search::{SearchResults, SearchService};
pub use self::tags::TagService;
pub use self::tasks::{ForumJobHandler, Job};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, UserId, UserValidationError, Username};
pub use self::vote::{SubscriptionType, Vote, VoteToggle, VoteType};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use forum::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
