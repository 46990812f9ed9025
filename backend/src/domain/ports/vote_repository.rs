//! Port abstraction for votes and subscriptions.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::{PostId, SubscriptionType, UserId, Vote, VoteToggle, VoteType};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by vote and subscription adapters.
    pub enum VoteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "vote repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "vote repository query failed: {message}",
    }
}

/// Storage of votes, unique per user, post and type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Add the vote, or remove it when an identical vote exists.
    async fn toggle(
        &self,
        user_id: UserId,
        post_id: PostId,
        vote_type: VoteType,
        at: DateTime<Utc>,
    ) -> Result<VoteToggle, VoteRepositoryError>;

    /// Number of votes cast on posts written by `author`.
    async fn count_received(&self, author: UserId) -> Result<u64, VoteRepositoryError>;

    /// Votes cast on posts written by `author`, newest first.
    async fn list_received(
        &self,
        author: UserId,
        window: PageWindow,
    ) -> Result<Vec<Vote>, VoteRepositoryError>;
}

/// Storage of thread subscriptions, unique per user and post.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create or update a subscription.
    async fn subscribe(
        &self,
        user_id: UserId,
        post_id: PostId,
        kind: SubscriptionType,
    ) -> Result<(), VoteRepositoryError>;

    /// The user's subscription to a thread, if any.
    async fn find(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<SubscriptionType>, VoteRepositoryError>;
}
