//! In-memory adapters implementing every storage port.
//!
//! [`MemoryForum`] keeps the whole forum in one `RwLock`-guarded state. It is
//! selected when no database URL is configured and backs the integration
//! tests. Locks are only held for synchronous sections; no guard crosses an
//! `.await`.

mod accounts;
mod badges;
mod posts;

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::{
    Badge, BadgeId, Job, ModerationLog, Post, PostId, Profile, Role, SubscriptionType, UserId,
    VoteType,
};

#[derive(Debug, Clone)]
struct StoredUser {
    username: String,
    email: String,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct StoredAward {
    id: i64,
    badge_id: BadgeId,
    user_id: UserId,
    post_id: Option<PostId>,
    awarded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ForumState {
    users: HashMap<UserId, StoredUser>,
    profiles: HashMap<UserId, Profile>,
    posts: HashMap<PostId, Post>,
    votes: HashMap<(UserId, PostId, VoteType), DateTime<Utc>>,
    subscriptions: HashMap<(UserId, PostId), SubscriptionType>,
    badges: Vec<Badge>,
    awards: Vec<StoredAward>,
    logs: Vec<ModerationLog>,
    spool: VecDeque<Job>,
    next_id: i64,
}

impl ForumState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Marker for a poisoned state lock; each port maps it onto its own error.
struct Poisoned;

/// The whole forum held in memory.
#[derive(Debug, Default)]
pub struct MemoryForum {
    state: RwLock<ForumState>,
}

impl MemoryForum {
    /// Create an empty forum.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ForumState>, Poisoned> {
        self.state.read().map_err(|_| Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ForumState>, Poisoned> {
        self.state.write().map_err(|_| Poisoned)
    }

    /// Change a member's role. Used by seeding and tests to create
    /// moderators; returns whether the member exists.
    pub fn set_role(&self, user_id: UserId, role: Role) -> bool {
        let Ok(mut state) = self.write() else {
            return false;
        };
        state
            .profiles
            .get_mut(&user_id)
            .map(|profile| profile.role = role)
            .is_some()
    }

    /// Jobs waiting in the spool, oldest first.
    pub fn spooled_jobs(&self) -> Vec<Job> {
        self.read()
            .map(|state| state.spool.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Apply a page window to an already ordered sequence.
fn paged<T>(items: impl Iterator<Item = T>, window: PageWindow) -> Vec<T> {
    let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit()).unwrap_or(usize::MAX);
    items.skip(offset).take(limit).collect()
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
