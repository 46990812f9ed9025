//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports describe what the domain needs from storage, caching, search
//! and background work. Adapters live under `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod badge_repository;
mod cache_key;
mod count_cache;
mod credential_hasher;
mod moderation_log_repository;
mod post_repository;
mod profile_repository;
mod search_index;
mod tag_repository;
mod task_dispatcher;
mod vote_repository;

#[cfg(test)]
pub use badge_repository::MockBadgeRepository;
pub use badge_repository::{BadgeRepository, BadgeRepositoryError};
pub use cache_key::CountCacheKey;
#[cfg(test)]
pub use count_cache::MockCountCache;
pub use count_cache::{CountCache, CountCacheError};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHashError, CredentialHasher};
#[cfg(test)]
pub use moderation_log_repository::MockModerationLogRepository;
pub use moderation_log_repository::{ModerationLogError, ModerationLogRepository};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{
    NewAccount, ProfileRepository, ProfileRepositoryError, StoredCredentials,
};
#[cfg(test)]
pub use search_index::MockSearchIndex;
pub use search_index::{SearchHit, SearchIndex, SearchIndexError};
#[cfg(test)]
pub use tag_repository::MockTagRepository;
pub use tag_repository::{TagCount, TagRepository, TagRepositoryError};
#[cfg(test)]
pub use task_dispatcher::{MockJobHandler, MockTaskDispatcher, MockTaskSpool};
pub use task_dispatcher::{JobDispatchError, JobHandler, TaskDispatcher, TaskSpool};
#[cfg(test)]
pub use vote_repository::{MockSubscriptionRepository, MockVoteRepository};
pub use vote_repository::{
    SubscriptionRepository, VoteRepository, VoteRepositoryError,
};
