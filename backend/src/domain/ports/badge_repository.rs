//! Port abstraction for badges and awards.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::{AwardDefinition, AwardRecord, Badge, BadgeId, BadgeWithCount, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by badge repository adapters.
    pub enum BadgeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "badge repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "badge repository query failed: {message}",
    }
}

/// Storage of badges and granted awards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Insert the badge named by `definition` or refresh its description,
    /// icon and tier. Never creates a second badge with the same name.
    async fn upsert(&self, definition: &AwardDefinition) -> Result<Badge, BadgeRepositoryError>;

    /// Every badge with its award count, most awarded first.
    async fn list_with_counts(&self) -> Result<Vec<BadgeWithCount>, BadgeRepositoryError>;

    /// Fetch a badge by identifier.
    async fn find(&self, id: BadgeId) -> Result<Option<Badge>, BadgeRepositoryError>;

    /// Fetch a badge by name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Badge>, BadgeRepositoryError>;

    /// Number of awards of a badge, optionally for one user.
    async fn count_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
    ) -> Result<u64, BadgeRepositoryError>;

    /// Awards of a badge, newest first, optionally for one user.
    async fn list_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
        window: PageWindow,
    ) -> Result<Vec<AwardRecord>, BadgeRepositoryError>;

    /// Grant an award unless the same (badge, user, post) award exists.
    /// Returns whether a new award was created.
    async fn grant(
        &self,
        badge_id: BadgeId,
        user_id: UserId,
        post_id: Option<PostId>,
        at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError>;
}
