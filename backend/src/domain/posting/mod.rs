//! Authoring, reading and voting on posts.

mod forms;

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

pub use forms::{
    AnswerForm, CONTENT_MIN, CleanPost, PostForm, TAGS_MAX, TITLE_MAX, TITLE_MIN,
    validate_answer_form, validate_post_form,
};

use super::authorization::require_active_member;
use super::moderation::ReputationPolicy;
use super::ports::{CountCache, CountCacheKey, PostRepository, ProfileRepository, TaskDispatcher, VoteRepository};
use super::{
    Error, Job, NewPost, Post, PostId, PostListing, PostStatus, PostType, Profile, SpamStatus,
    Viewer, VoteToggle, VoteType,
};

/// Upvotes at which a post earns its author a badge.
pub const POPULAR_VOTES: i32 = 3;

/// Views a question must exceed to earn "Popular Question".
pub const POPULAR_VIEWS: i32 = 1_000;

/// A thread as shown to one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// The opening post.
    pub root: PostListing,
    /// Replies the viewer may see, oldest first.
    pub replies: Vec<PostListing>,
}

/// Outcome of looking up a thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadLookup {
    /// The thread, ready to render.
    Found(Thread),
    /// The id names a reply; view its thread instead.
    Moved(PostId),
    /// The viewer may not see the post.
    Hidden,
}

/// Result of a vote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    /// Whether the vote was added or withdrawn.
    pub toggle: VoteToggle,
    /// Post vote count after the toggle.
    pub vote_count: i32,
}

/// Authoring and voting use-cases.
#[derive(Clone)]
pub struct PostingService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    votes: Arc<dyn VoteRepository>,
    dispatcher: Arc<dyn TaskDispatcher>,
    views: Arc<dyn CountCache>,
    clock: Arc<dyn Clock>,
    policy: ReputationPolicy,
    view_timeout: Duration,
}

/// Collaborators of [`PostingService`].
pub struct PostingPorts {
    /// Post storage.
    pub posts: Arc<dyn PostRepository>,
    /// Profile storage, for reputation changes.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Vote storage.
    pub votes: Arc<dyn VoteRepository>,
    /// Background work.
    pub dispatcher: Arc<dyn TaskDispatcher>,
    /// Holds view markers so repeated views are not counted.
    pub views: Arc<dyn CountCache>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl PostingService {
    /// Create the service.
    pub fn new(ports: PostingPorts, policy: ReputationPolicy, view_timeout: Duration) -> Self {
        Self {
            posts: ports.posts,
            profiles: ports.profiles,
            votes: ports.votes,
            dispatcher: ports.dispatcher,
            views: ports.views,
            clock: ports.clock,
            policy,
            view_timeout,
        }
    }

    fn initial_spam(&self, author: &Profile) -> SpamStatus {
        if author.is_low_rep(self.policy.low_rep_threshold) {
            SpamStatus::Quarantined
        } else {
            SpamStatus::NotSpam
        }
    }

    async fn load_post(&self, post_id: PostId) -> Result<Post, Error> {
        self.posts
            .find(post_id)
            .await?
            .ok_or_else(|| Error::not_found("post does not exist"))
    }

    /// Open a new thread.
    ///
    /// Low reputation authors start in quarantine until a moderator releases
    /// the post.
    pub async fn create_post(&self, viewer: &Viewer, form: &PostForm) -> Result<Post, Error> {
        let author = require_active_member(viewer)?;
        let clean = validate_post_form(form)?;
        let new_post = NewPost::root(
            author.user_id,
            clean.post_type,
            clean.title,
            clean.content,
            clean.tags,
            self.clock.utc(),
        )
        .with_spam(self.initial_spam(author));

        let post = self.posts.insert(new_post).await?;
        info!(post_id = %post.id, author = %author.user_id, spam = ?post.spam, "post created");
        self.dispatcher.dispatch(Job::PostCreated { post_id: post.id }).await;
        Ok(post)
    }

    /// Reply to `parent_id`. Replies to the opening post are answers, deeper
    /// replies are comments.
    pub async fn create_answer(
        &self,
        viewer: &Viewer,
        parent_id: PostId,
        form: &AnswerForm,
    ) -> Result<Post, Error> {
        let author = require_active_member(viewer)?;
        let content = validate_answer_form(form)?;
        let parent = self.load_post(parent_id).await?;
        let root = if parent.is_root() {
            parent.clone()
        } else {
            self.load_post(parent.thread_root()).await?
        };
        if root.status != PostStatus::Open {
            return Err(Error::invalid_request("this thread is not open for replies"));
        }

        let post_type = if parent.is_root() {
            PostType::Answer
        } else {
            PostType::Comment
        };
        let new_post = NewPost::reply(author.user_id, post_type, &parent, content, self.clock.utc())
            .with_spam(self.initial_spam(author));
        let post = self.posts.insert(new_post).await?;
        info!(post_id = %post.id, root = %root.id, "reply created");
        self.dispatcher.dispatch(Job::AnswerCreated { post_id: post.id }).await;
        Ok(post)
    }

    /// Look up a thread for `viewer`, counting the view once per
    /// `viewer_key` within the view timeout.
    pub async fn view_thread(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        viewer_key: &str,
    ) -> Result<ThreadLookup, Error> {
        let post = self.load_post(post_id).await?;
        if !post.is_root() {
            return Ok(ThreadLookup::Moved(post.thread_root()));
        }
        let profile = viewer.profile();
        let is_moderator = viewer.is_moderator();
        if post.spam.is_hidden() && profile.is_none() {
            return Ok(ThreadLookup::Hidden);
        }
        if post.status == PostStatus::Deleted
            && !is_moderator
            && profile.is_none_or(|p| p.user_id != post.author_id)
        {
            return Ok(ThreadLookup::Hidden);
        }

        self.count_view(&post, viewer_key).await;

        let listings = self.posts.thread(post_id).await?;
        let mut root = None;
        let mut replies = Vec::new();
        for listing in listings {
            if listing.post.id == post_id {
                root = Some(listing);
                continue;
            }
            let own = profile.is_some_and(|p| p.user_id == listing.post.author_id);
            let hidden = listing.post.spam.is_hidden() || listing.post.status == PostStatus::Deleted;
            if !hidden || is_moderator || own {
                replies.push(listing);
            }
        }
        let root = root.ok_or_else(|| Error::not_found("post does not exist"))?;
        Ok(ThreadLookup::Found(Thread { root, replies }))
    }

    async fn count_view(&self, post: &Post, viewer_key: &str) {
        let post_id = post.id;
        let Some(marker) = CountCacheKey::sanitize(&format!("view-{post_id}-{viewer_key}")) else {
            return;
        };
        match self.views.get(&marker).await {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(error) => {
                warn!(%post_id, %error, "view marker read failed; view not counted");
                return;
            }
        }
        if let Err(error) = self.views.set(&marker, 1, self.view_timeout).await {
            warn!(%post_id, %error, "view marker write failed");
        }
        match self.posts.increment_views(post_id).await {
            Ok(view_count) if post.post_type == PostType::Question && view_count == POPULAR_VIEWS + 1 => {
                self.dispatcher
                    .dispatch(Job::AwardBadge {
                        badge: "Popular Question".to_owned(),
                        user_id: post.author_id,
                        post_id: Some(post_id),
                    })
                    .await;
            }
            Ok(_) => {}
            Err(error) => warn!(%post_id, %error, "view count update failed"),
        }
    }

    /// Add or withdraw a vote.
    ///
    /// Members cannot upvote or accept their own posts, and only the thread
    /// author can accept a reply.
    pub async fn toggle_vote(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, Error> {
        let voter = require_active_member(viewer)?;
        let post = self.load_post(post_id).await?;

        if vote_type != VoteType::Bookmark && post.author_id == voter.user_id {
            return Err(Error::invalid_request("you can not vote on your own post"));
        }
        if vote_type == VoteType::Accept {
            if post.is_root() {
                return Err(Error::invalid_request("only replies can be accepted"));
            }
            let root = self.load_post(post.thread_root()).await?;
            if root.author_id != voter.user_id {
                return Err(Error::forbidden("only the thread author can accept a reply"));
            }
        }

        let toggle = self
            .votes
            .toggle(voter.user_id, post_id, vote_type, self.clock.utc())
            .await?;
        let delta = match toggle {
            VoteToggle::Added => vote_type.score_delta(),
            VoteToggle::Removed => -vote_type.score_delta(),
        };
        let vote_count = if delta == 0 {
            post.vote_count
        } else {
            let stored = self.posts.adjust_votes(post_id, delta).await?;
            self.profiles.adjust_score(post.author_id, delta).await?;
            stored
        };

        if toggle == VoteToggle::Added {
            if let Some(badge) = earned_badge(&post, vote_type, vote_count) {
                self.dispatcher
                    .dispatch(Job::AwardBadge {
                        badge: badge.to_owned(),
                        user_id: post.author_id,
                        post_id: Some(post_id),
                    })
                    .await;
            }
        }
        Ok(VoteOutcome { toggle, vote_count })
    }
}

fn earned_badge(post: &Post, vote_type: VoteType, vote_count: i32) -> Option<&'static str> {
    match vote_type {
        VoteType::Accept => Some("Scholar"),
        VoteType::Upvote if vote_count == POPULAR_VOTES => match post.post_type {
            PostType::Question => Some("Student"),
            PostType::Answer => Some("Teacher"),
            PostType::Comment => Some("Commentator"),
            _ => None,
        },
        VoteType::Upvote | VoteType::Bookmark => None,
    }
}

#[cfg(test)]
mod tests;
