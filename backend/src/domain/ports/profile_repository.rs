//! Port abstraction for member accounts and profiles.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::community::CommunityQuery;
use crate::domain::{EmailAddress, Profile, ProfileUid, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
        /// Username or email already registered.
        Duplicate { message: String } => "account already exists: {message}",
    }
}

/// Account row as needed for authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Account identifier.
    pub user_id: UserId,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

/// A user and profile about to be created together.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// Normalised login name.
    pub username: String,
    /// Contact address.
    pub email: EmailAddress,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// Profile created alongside the user.
    pub profile: Profile,
}

/// Storage of users and their one-to-one profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a user and its profile atomically.
    async fn create_account(&self, account: NewAccount) -> Result<Profile, ProfileRepositoryError>;

    /// Look up credentials by username or email.
    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, ProfileRepositoryError>;

    /// Fetch a profile by user.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Fetch a profile by its public identifier.
    async fn find_by_uid(&self, uid: &ProfileUid) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Add `delta` to the reputation score.
    async fn adjust_score(&self, user_id: UserId, delta: i32) -> Result<(), ProfileRepositoryError>;

    /// Record a successful login.
    async fn touch_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), ProfileRepositoryError>;

    /// Replace the display name and watched tags.
    async fn update_details(
        &self,
        user_id: UserId,
        name: &str,
        my_tags: &str,
    ) -> Result<(), ProfileRepositoryError>;

    /// Number of profiles matching `query`.
    async fn count_community(&self, query: &CommunityQuery) -> Result<u64, ProfileRepositoryError>;

    /// The slice of profiles matching `query` selected by `window`.
    async fn list_community(
        &self,
        query: &CommunityQuery,
        window: PageWindow,
    ) -> Result<Vec<Profile>, ProfileRepositoryError>;
}
