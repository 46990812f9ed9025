//! Background jobs and their handler.
//!
//! Jobs are plain serialisable values so every dispatch strategy (inline,
//! spawned, spooled) can carry them. [`ForumJobHandler`] executes them against
//! the repositories.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::listing::PostQuery;
use super::ports::{BadgeRepository, JobHandler, PostRepository, SubscriptionRepository};
use super::{Error, PostId, SubscriptionType, UserId};

/// Unit of background work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    /// A thread was opened; subscribe its author.
    PostCreated {
        /// New top-level post.
        post_id: PostId,
    },
    /// A reply was added; subscribe its author to the thread.
    AnswerCreated {
        /// New reply.
        post_id: PostId,
    },
    /// Grant a badge by name.
    AwardBadge {
        /// Badge name.
        badge: String,
        /// Recipient.
        user_id: UserId,
        /// Post that earned the badge.
        post_id: Option<PostId>,
    },
    /// Log site statistics.
    ReportStatistics,
}

impl Job {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PostCreated { .. } => "post_created",
            Self::AnswerCreated { .. } => "answer_created",
            Self::AwardBadge { .. } => "award_badge",
            Self::ReportStatistics => "report_statistics",
        }
    }
}

/// Executes [`Job`] values using the forum repositories.
#[derive(Clone)]
pub struct ForumJobHandler {
    posts: Arc<dyn PostRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    badges: Arc<dyn BadgeRepository>,
    clock: Arc<dyn Clock>,
}

impl ForumJobHandler {
    /// Create a handler over the given repositories.
    pub fn new(
        posts: Arc<dyn PostRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        badges: Arc<dyn BadgeRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            subscriptions,
            badges,
            clock,
        }
    }

    async fn subscribe_author(&self, post_id: PostId) -> Result<(), Error> {
        let Some(post) = self.posts.find(post_id).await? else {
            warn!(%post_id, "post vanished before subscription");
            return Ok(());
        };
        let existing = self
            .subscriptions
            .find(post.author_id, post.thread_root())
            .await?;
        if existing.is_none() {
            self.subscriptions
                .subscribe(post.author_id, post.thread_root(), SubscriptionType::Local)
                .await?;
        }
        Ok(())
    }

    async fn award(&self, badge: &str, user_id: UserId, post_id: Option<PostId>) -> Result<(), Error> {
        let Some(found) = self.badges.find_by_name(badge).await? else {
            warn!(badge, "award requested for unknown badge");
            return Ok(());
        };
        let granted = self
            .badges
            .grant(found.id, user_id, post_id, self.clock.utc())
            .await?;
        if granted {
            info!(badge, %user_id, "badge awarded");
        }
        Ok(())
    }
}

#[async_trait]
impl JobHandler for ForumJobHandler {
    async fn handle(&self, job: &Job) -> Result<(), Error> {
        match job {
            Job::PostCreated { post_id } | Job::AnswerCreated { post_id } => {
                self.subscribe_author(*post_id).await
            }
            Job::AwardBadge {
                badge,
                user_id,
                post_id,
            } => self.award(badge, *user_id, *post_id).await,
            Job::ReportStatistics => {
                let visible = self.posts.count(&PostQuery::visible()).await?;
                info!(visible_posts = visible, at = %self.clock.utc(), "site statistics");
                Ok(())
            }
        }
    }
}
