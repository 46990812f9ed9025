//! Accounts, profiles, votes and subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::community::{CommunityOrder, CommunityQuery};
use crate::domain::ports::{
    NewAccount, ProfileRepository, ProfileRepositoryError, StoredCredentials,
    SubscriptionRepository, VoteRepository, VoteRepositoryError,
};
use crate::domain::{
    PostId, Profile, ProfileUid, SubscriptionType, UserId, Vote, VoteToggle,
    VoteType,
};

use super::{MemoryForum, Poisoned, StoredUser, count, paged};

impl From<Poisoned> for ProfileRepositoryError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

impl From<Poisoned> for VoteRepositoryError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

fn update_profile(
    forum: &MemoryForum,
    user_id: UserId,
    change: impl FnOnce(&mut Profile),
) -> Result<(), ProfileRepositoryError> {
    let mut state = forum.write()?;
    let profile = state
        .profiles
        .get_mut(&user_id)
        .ok_or_else(|| ProfileRepositoryError::query(format!("profile {user_id} not found")))?;
    change(profile);
    Ok(())
}

fn community_sorted<'a>(forum_profiles: impl Iterator<Item = &'a Profile>, order: CommunityOrder) -> Vec<&'a Profile> {
    let mut profiles: Vec<&Profile> = forum_profiles.collect();
    profiles.sort_by(|a, b| {
        let primary = match order {
            // `None` sorts first in ascending order, so reversing puts
            // members who never logged in last.
            CommunityOrder::Visit => b.last_login.cmp(&a.last_login),
            CommunityOrder::Reputation => b.score.cmp(&a.score),
            CommunityOrder::Joined => b.date_joined.cmp(&a.date_joined),
        };
        primary.then_with(|| b.user_id.as_uuid().cmp(a.user_id.as_uuid()))
    });
    profiles
}

#[async_trait]
impl ProfileRepository for MemoryForum {
    async fn create_account(&self, account: NewAccount) -> Result<Profile, ProfileRepositoryError> {
        let mut state = self.write()?;
        let taken = state.users.values().any(|user| {
            user.username == account.username || user.email == account.email.as_str()
        });
        if taken {
            return Err(ProfileRepositoryError::duplicate("username or email is taken"));
        }
        let user_id = account.profile.user_id;
        state.users.insert(
            user_id,
            StoredUser {
                username: account.username,
                email: account.email.as_str().to_owned(),
                password_hash: account.password_hash,
            },
        );
        state.profiles.insert(user_id, account.profile.clone());
        Ok(account.profile)
    }

    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, ProfileRepositoryError> {
        let login = login.trim().to_lowercase();
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .find(|(_, user)| user.username == login || user.email == login)
            .map(|(user_id, user)| StoredCredentials {
                user_id: *user_id,
                password_hash: user.password_hash.clone(),
            }))
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self.read()?.profiles.get(&user_id).cloned())
    }

    async fn find_by_uid(&self, uid: &ProfileUid) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self
            .read()?
            .profiles
            .values()
            .find(|profile| profile.uid == *uid)
            .cloned())
    }

    async fn adjust_score(&self, user_id: UserId, delta: i32) -> Result<(), ProfileRepositoryError> {
        update_profile(self, user_id, |profile| profile.score += delta)
    }

    async fn touch_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), ProfileRepositoryError> {
        update_profile(self, user_id, |profile| profile.last_login = Some(at))
    }

    async fn update_details(
        &self,
        user_id: UserId,
        name: &str,
        my_tags: &str,
    ) -> Result<(), ProfileRepositoryError> {
        update_profile(self, user_id, |profile| {
            name.clone_into(&mut profile.name);
            my_tags.clone_into(&mut profile.my_tags);
        })
    }

    async fn count_community(&self, query: &CommunityQuery) -> Result<u64, ProfileRepositoryError> {
        let state = self.read()?;
        Ok(count(
            state
                .profiles
                .values()
                .filter(|profile| query.matches(profile))
                .count(),
        ))
    }

    async fn list_community(
        &self,
        query: &CommunityQuery,
        window: PageWindow,
    ) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let state = self.read()?;
        let sorted = community_sorted(
            state.profiles.values().filter(|profile| query.matches(profile)),
            query.order,
        );
        Ok(paged(sorted.into_iter().cloned(), window))
    }
}

#[async_trait]
impl VoteRepository for MemoryForum {
    async fn toggle(
        &self,
        user_id: UserId,
        post_id: PostId,
        vote_type: VoteType,
        at: DateTime<Utc>,
    ) -> Result<VoteToggle, VoteRepositoryError> {
        let mut state = self.write()?;
        let key = (user_id, post_id, vote_type);
        if state.votes.remove(&key).is_some() {
            return Ok(VoteToggle::Removed);
        }
        state.votes.insert(key, at);
        Ok(VoteToggle::Added)
    }

    async fn count_received(&self, author: UserId) -> Result<u64, VoteRepositoryError> {
        let state = self.read()?;
        Ok(count(
            state
                .votes
                .keys()
                .filter(|(_, post_id, _)| {
                    state
                        .posts
                        .get(post_id)
                        .is_some_and(|post| post.author_id == author)
                })
                .count(),
        ))
    }

    async fn list_received(
        &self,
        author: UserId,
        window: PageWindow,
    ) -> Result<Vec<Vote>, VoteRepositoryError> {
        let state = self.read()?;
        let mut received: Vec<Vote> = state
            .votes
            .iter()
            .filter(|((_, post_id, _), _)| {
                state
                    .posts
                    .get(post_id)
                    .is_some_and(|post| post.author_id == author)
            })
            .map(|((user_id, post_id, vote_type), date)| Vote {
                user_id: *user_id,
                post_id: *post_id,
                vote_type: *vote_type,
                date: *date,
            })
            .collect();
        received.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.post_id.cmp(&a.post_id)));
        Ok(paged(received.into_iter(), window))
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryForum {
    async fn subscribe(
        &self,
        user_id: UserId,
        post_id: PostId,
        kind: SubscriptionType,
    ) -> Result<(), VoteRepositoryError> {
        self.write()?.subscriptions.insert((user_id, post_id), kind);
        Ok(())
    }

    async fn find(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<SubscriptionType>, VoteRepositoryError> {
        Ok(self.read()?.subscriptions.get(&(user_id, post_id)).copied())
    }
}
