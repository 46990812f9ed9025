//! Badges, tag statistics, the moderation log and the job spool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::ports::{
    BadgeRepository, BadgeRepositoryError, JobDispatchError, ModerationLogError,
    ModerationLogRepository, TagCount, TagRepository, TagRepositoryError, TaskSpool,
};
use crate::domain::{
    AwardDefinition, AwardRecord, Badge, BadgeId, BadgeWithCount, Job, ModerationChange,
    ModerationLog, NewModerationLog, PostId, PostStatus, SpamStatus, UserId, rank_at,
};

use super::{ForumState, MemoryForum, Poisoned, StoredAward, count, paged};

impl From<Poisoned> for BadgeRepositoryError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

impl From<Poisoned> for TagRepositoryError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

impl From<Poisoned> for ModerationLogError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

fn awards_of(
    state: &ForumState,
    badge_id: BadgeId,
    user_id: Option<UserId>,
) -> impl Iterator<Item = &StoredAward> {
    state.awards.iter().filter(move |award| {
        award.badge_id == badge_id && user_id.is_none_or(|user| award.user_id == user)
    })
}

/// Tag usage over visible threads whose tag contains `filter`, most used
/// first, ties by name.
fn tag_counts(state: &ForumState, filter: Option<&str>) -> Vec<TagCount> {
    let filter = filter.map(str::to_lowercase);
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for post in state.posts.values().filter(|post| {
        post.is_toplevel && post.status == PostStatus::Open && post.spam == SpamStatus::NotSpam
    }) {
        for tag in &post.tags {
            if filter
                .as_deref()
                .is_none_or(|needle| tag.to_lowercase().contains(needle))
            {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
    }
    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, post_count)| TagCount {
            name: name.to_owned(),
            post_count,
        })
        .collect();
    tags.sort_by(|a, b| b.post_count.cmp(&a.post_count).then_with(|| a.name.cmp(&b.name)));
    tags
}

#[async_trait]
impl BadgeRepository for MemoryForum {
    async fn upsert(&self, definition: &AwardDefinition) -> Result<Badge, BadgeRepositoryError> {
        let mut state = self.write()?;
        if let Some(existing) = state
            .badges
            .iter_mut()
            .find(|badge| badge.name == definition.name)
        {
            definition.description.clone_into(&mut existing.description);
            definition.icon.clone_into(&mut existing.icon);
            existing.kind = definition.kind;
            return Ok(existing.clone());
        }
        let badge = Badge {
            id: state.next_id(),
            name: definition.name.to_owned(),
            description: definition.description.to_owned(),
            icon: definition.icon.to_owned(),
            kind: definition.kind,
        };
        state.badges.push(badge.clone());
        Ok(badge)
    }

    async fn list_with_counts(&self) -> Result<Vec<BadgeWithCount>, BadgeRepositoryError> {
        let state = self.read()?;
        let mut listed: Vec<BadgeWithCount> = state
            .badges
            .iter()
            .map(|badge| BadgeWithCount {
                badge: badge.clone(),
                award_count: count(awards_of(&state, badge.id, None).count()),
            })
            .collect();
        listed.sort_by(|a, b| {
            b.award_count
                .cmp(&a.award_count)
                .then_with(|| a.badge.name.cmp(&b.badge.name))
        });
        Ok(listed)
    }

    async fn find(&self, id: BadgeId) -> Result<Option<Badge>, BadgeRepositoryError> {
        Ok(self.read()?.badges.iter().find(|badge| badge.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Badge>, BadgeRepositoryError> {
        Ok(self
            .read()?
            .badges
            .iter()
            .find(|badge| badge.name == name)
            .cloned())
    }

    async fn count_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
    ) -> Result<u64, BadgeRepositoryError> {
        let state = self.read()?;
        Ok(count(awards_of(&state, badge_id, user_id).count()))
    }

    async fn list_awards(
        &self,
        badge_id: BadgeId,
        user_id: Option<UserId>,
        window: PageWindow,
    ) -> Result<Vec<AwardRecord>, BadgeRepositoryError> {
        let state = self.read()?;
        let mut awards: Vec<&StoredAward> = awards_of(&state, badge_id, user_id).collect();
        awards.sort_by(|a, b| b.awarded_at.cmp(&a.awarded_at).then_with(|| b.id.cmp(&a.id)));
        Ok(paged(awards.into_iter(), window)
            .into_iter()
            .filter_map(|award| {
                let user = state.profiles.get(&award.user_id)?.summary();
                Some(AwardRecord {
                    badge_id: award.badge_id,
                    user,
                    post_id: award.post_id,
                    date: award.awarded_at,
                })
            })
            .collect())
    }

    async fn grant(
        &self,
        badge_id: BadgeId,
        user_id: UserId,
        post_id: Option<PostId>,
        at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError> {
        let mut state = self.write()?;
        let exists = awards_of(&state, badge_id, Some(user_id)).any(|award| award.post_id == post_id);
        if exists {
            return Ok(false);
        }
        let id = state.next_id();
        state.awards.push(StoredAward {
            id,
            badge_id,
            user_id,
            post_id,
            awarded_at: at,
        });
        Ok(true)
    }
}

#[async_trait]
impl TagRepository for MemoryForum {
    async fn count_tags(&self, filter: Option<String>) -> Result<u64, TagRepositoryError> {
        let state = self.read()?;
        Ok(count(tag_counts(&state, filter.as_deref()).len()))
    }

    async fn list_tags(
        &self,
        filter: Option<String>,
        window: PageWindow,
    ) -> Result<Vec<TagCount>, TagRepositoryError> {
        let state = self.read()?;
        Ok(paged(tag_counts(&state, filter.as_deref()).into_iter(), window))
    }
}

fn missing_target(state: &ForumState, change: &ModerationChange) -> Option<String> {
    match change {
        ModerationChange::SetSpam { post_id, .. }
        | ModerationChange::SetStatus { post_id, .. }
        | ModerationChange::Bump { post_id, .. } => {
            (!state.posts.contains_key(post_id)).then(|| format!("post {post_id}"))
        }
        ModerationChange::SetState { user_id, .. } | ModerationChange::AdjustScore { user_id, .. } => {
            (!state.profiles.contains_key(user_id)).then(|| format!("user {user_id}"))
        }
    }
}

fn apply_change(state: &mut ForumState, change: ModerationChange) {
    match change {
        ModerationChange::SetSpam { post_id, spam } => {
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.spam = spam;
            }
        }
        ModerationChange::SetStatus { post_id, status } => {
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.status = status;
            }
        }
        ModerationChange::Bump { post_id, at } => {
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.rank = rank_at(at);
                post.lastedit_date = at;
            }
        }
        ModerationChange::SetState { user_id, state: profile_state } => {
            if let Some(profile) = state.profiles.get_mut(&user_id) {
                profile.state = profile_state;
            }
        }
        ModerationChange::AdjustScore { user_id, delta } => {
            if let Some(profile) = state.profiles.get_mut(&user_id) {
                profile.score += delta;
            }
        }
    }
}

#[async_trait]
impl ModerationLogRepository for MemoryForum {
    async fn apply(
        &self,
        changes: Vec<ModerationChange>,
        entry: NewModerationLog,
    ) -> Result<ModerationLog, ModerationLogError> {
        let mut state = self.write()?;
        // Check every target before touching anything.
        if let Some(missing) = changes.iter().find_map(|change| missing_target(&state, change)) {
            return Err(ModerationLogError::missing_target(missing));
        }
        for change in changes {
            apply_change(&mut state, change);
        }
        let log = ModerationLog {
            id: state.next_id(),
            actor_id: entry.actor_id,
            target_user_id: entry.target_user_id,
            post_id: entry.post_id,
            action: entry.action,
            created_at: entry.created_at,
        };
        state.logs.push(log.clone());
        Ok(log)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ModerationLog>, ModerationLogError> {
        let state = self.read()?;
        let mut logs = state.logs.clone();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        logs.truncate(limit);
        Ok(logs)
    }
}

#[async_trait]
impl TaskSpool for MemoryForum {
    async fn enqueue(&self, job: &Job) -> Result<(), JobDispatchError> {
        self.write()
            .map_err(|_| JobDispatchError::unavailable("forum state lock poisoned"))?
            .spool
            .push_back(job.clone());
        Ok(())
    }

    async fn claim(&self, limit: usize) -> Result<Vec<Job>, JobDispatchError> {
        let mut state = self
            .write()
            .map_err(|_| JobDispatchError::unavailable("forum state lock poisoned"))?;
        let take = limit.min(state.spool.len());
        Ok(state.spool.drain(..take).collect())
    }
}
