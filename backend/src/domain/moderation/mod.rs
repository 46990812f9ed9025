//! Moderation state machine for posts and members.
//!
//! Every successful mutation appends exactly one entry to the moderation log.
//! Rejected submissions and no-op transitions append nothing. Each action's
//! changes and its log entry are committed together, so a failure leaves
//! neither behind.

mod forms;

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

pub use forms::{
    PostAction, PostModerationForm, UserModerationForm, validate_post_moderation,
    validate_user_moderation,
};

use super::authorization::require_moderator;
use super::ports::{ModerationLogRepository, PostRepository, ProfileRepository};
use super::{
    Error, ModerationChange, ModerationLog, NewModerationLog, NextPage, Post, PostId, PostStatus,
    Profile, ProfileUid, RECENT_LOG_LIMIT, SpamStatus, Viewer,
};

/// Reputation rules applied by moderation and posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationPolicy {
    /// Authors scoring below this are low reputation.
    pub low_rep_threshold: i32,
    /// Score added when a low reputation author's post is released.
    pub bump: i32,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            low_rep_threshold: 5,
            bump: 1,
        }
    }
}

/// Result of a spam toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamDecision {
    /// Affected post.
    pub post_id: PostId,
    /// Spam state after the action.
    pub spam: SpamStatus,
    /// Whether the state actually changed.
    pub changed: bool,
    /// Where to send the moderator.
    pub next: NextPage,
}

/// Result of releasing a quarantined post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDecision {
    /// Affected post.
    pub post_id: PostId,
    /// Whether the post left quarantine or spam.
    pub changed: bool,
    /// Whether the author received a reputation bump.
    pub author_bumped: bool,
    /// Where to send the moderator.
    pub next: NextPage,
}

/// Applies moderation actions.
#[derive(Clone)]
pub struct ModerationService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    logs: Arc<dyn ModerationLogRepository>,
    clock: Arc<dyn Clock>,
    policy: ReputationPolicy,
}

impl ModerationService {
    /// Create a moderation service.
    pub fn new(
        posts: Arc<dyn PostRepository>,
        profiles: Arc<dyn ProfileRepository>,
        logs: Arc<dyn ModerationLogRepository>,
        clock: Arc<dyn Clock>,
        policy: ReputationPolicy,
    ) -> Self {
        Self {
            posts,
            profiles,
            logs,
            clock,
            policy,
        }
    }

    async fn load_post(&self, post_id: PostId) -> Result<Post, Error> {
        self.posts
            .find(post_id)
            .await?
            .ok_or_else(|| Error::not_found("post does not exist"))
    }

    async fn commit(
        &self,
        changes: Vec<ModerationChange>,
        entry: NewModerationLog,
    ) -> Result<ModerationLog, Error> {
        let stored = self.logs.apply(changes, entry).await?;
        info!(actor = %stored.actor_id, action = %stored.action, "moderation action recorded");
        Ok(stored)
    }

    /// Mark a post as spam, or restore it when `restore` is set.
    ///
    /// Marking sends the moderator to the spam queue; restoring sends them
    /// home.
    pub async fn mark_spam(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        restore: bool,
    ) -> Result<SpamDecision, Error> {
        let actor = require_moderator(viewer)?;
        let post = self.load_post(post_id).await?;
        let target = if restore {
            SpamStatus::NotSpam
        } else {
            SpamStatus::Spam
        };
        let next = match target {
            SpamStatus::Spam => NextPage::SpamQueue,
            SpamStatus::NotSpam | SpamStatus::Quarantined => NextPage::Home,
        };
        if post.spam == target {
            return Ok(SpamDecision {
                post_id,
                spam: target,
                changed: false,
                next,
            });
        }

        let text = if restore {
            "restored post from spam"
        } else {
            "marked post as spam"
        };
        self.commit(
            vec![ModerationChange::SetSpam {
                post_id,
                spam: target,
            }],
            NewModerationLog::for_post(actor.user_id, post_id, text, self.clock.utc())
                .with_target(post.author_id),
        )
        .await?;
        Ok(SpamDecision {
            post_id,
            spam: target,
            changed: true,
            next,
        })
    }

    /// Release a post from quarantine (or spam) without the spam toggle.
    ///
    /// A low reputation author is bumped once per release, so releasing an
    /// already visible post changes nothing.
    pub async fn release_quarantine(
        &self,
        viewer: &Viewer,
        post_id: PostId,
    ) -> Result<ReleaseDecision, Error> {
        let actor = require_moderator(viewer)?;
        let post = self.load_post(post_id).await?;
        if post.spam == SpamStatus::NotSpam {
            return Ok(ReleaseDecision {
                post_id,
                changed: false,
                author_bumped: false,
                next: NextPage::Home,
            });
        }

        let author = self.profiles.find_by_user(post.author_id).await?;
        let author_bumped = author
            .as_ref()
            .is_some_and(|author| author.is_low_rep(self.policy.low_rep_threshold));
        let mut changes = vec![ModerationChange::SetSpam {
            post_id,
            spam: SpamStatus::NotSpam,
        }];
        if author_bumped {
            changes.push(ModerationChange::AdjustScore {
                user_id: post.author_id,
                delta: self.policy.bump,
            });
        }
        self.commit(
            changes,
            NewModerationLog::for_post(actor.user_id, post_id, "released post from quarantine", self.clock.utc())
                .with_target(post.author_id),
        )
        .await?;
        Ok(ReleaseDecision {
            post_id,
            changed: true,
            author_bumped,
            next: NextPage::Home,
        })
    }

    /// Open, close, delete or bump a post.
    pub async fn moderate_post(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        form: &PostModerationForm,
    ) -> Result<NextPage, Error> {
        let actor = require_moderator(viewer)?;
        let action = validate_post_moderation(form)?;
        let post = self.load_post(post_id).await?;
        let thread = if post.is_root() {
            NextPage::Post(post.id)
        } else {
            NextPage::Post(post.thread_root())
        };

        let set_status = |status| ModerationChange::SetStatus { post_id, status };
        let (change, next) = match &action {
            PostAction::Open => (set_status(PostStatus::Open), thread),
            PostAction::Close { .. } => (set_status(PostStatus::Closed), thread),
            PostAction::Delete => {
                let next = if post.is_root() { NextPage::Home } else { thread };
                (set_status(PostStatus::Deleted), next)
            }
            PostAction::Bump => (
                ModerationChange::Bump {
                    post_id,
                    at: self.clock.utc(),
                },
                thread,
            ),
        };
        self.commit(
            vec![change],
            NewModerationLog::for_post(actor.user_id, post_id, action.log_text(), self.clock.utc())
                .with_target(post.author_id),
        )
        .await?;
        Ok(next)
    }

    /// Change a member's moderation state.
    ///
    /// Validation failures are returned as an invalid request error carrying
    /// the form errors; nothing is persisted or logged in that case.
    pub async fn moderate_user(
        &self,
        viewer: &Viewer,
        target_uid: &ProfileUid,
        form: &UserModerationForm,
    ) -> Result<Profile, Error> {
        let actor = require_moderator(viewer)?;
        let mut target = self
            .profiles
            .find_by_uid(target_uid)
            .await?
            .ok_or_else(|| Error::not_found("user does not exist"))?;
        let state = validate_user_moderation(actor, &target, form)?;

        self.commit(
            vec![ModerationChange::SetState {
                user_id: target.user_id,
                state,
            }],
            NewModerationLog::for_user(
                actor.user_id,
                target.user_id,
                format!("set state to {}", state.label()),
                self.clock.utc(),
            ),
        )
        .await?;
        target.state = state;
        Ok(target)
    }

    /// The most recent log entries; non-moderators get an empty list.
    pub async fn recent_logs(&self, viewer: &Viewer) -> Result<Vec<ModerationLog>, Error> {
        if !viewer.is_moderator() {
            return Ok(Vec::new());
        }
        Ok(self.logs.recent(RECENT_LOG_LIMIT).await?)
    }
}

#[cfg(test)]
mod tests;
