//! Port interface for the external full-text search backend.
use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::PostId;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by search adapters.
    pub enum SearchIndexError {
        /// The search backend is unreachable.
        Unavailable { message: String } => "search backend unavailable: {message}",
        /// The search backend answered with something unexpected.
        Protocol { message: String } => "search backend response invalid: {message}",
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Matching post.
    pub post_id: PostId,
    /// Relevance, higher is better.
    pub score: f32,
}

/// Full-text search over posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Ranked hits for `query`, best first, at most `limit` of them.
    async fn perform_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchIndexError>;
}
