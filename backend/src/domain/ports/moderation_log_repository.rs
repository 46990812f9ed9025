//! Port abstraction for the append-only moderation log.
use async_trait::async_trait;

use crate::domain::{ModerationChange, ModerationLog, NewModerationLog};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by moderation log adapters.
    pub enum ModerationLogError {
        /// Repository connection could not be established.
        Connection { message: String } => "moderation log connection failed: {message}",
        /// Query or insert failed during execution.
        Query { message: String } => "moderation log query failed: {message}",
        /// A change named a post or member that does not exist.
        MissingTarget { message: String } => "moderation target not found: {message}",
    }
}

/// Append-only storage of moderation actions. Entries are never updated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationLogRepository: Send + Sync {
    /// Apply `changes` and append `entry` atomically: either every change
    /// and the entry are stored, or nothing is.
    async fn apply(
        &self,
        changes: Vec<ModerationChange>,
        entry: NewModerationLog,
    ) -> Result<ModerationLog, ModerationLogError>;

    /// The most recent `limit` entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ModerationLog>, ModerationLogError>;
}
