//! Port abstraction for tag statistics.
use async_trait::async_trait;
use pagination::PageWindow;
use serde::Serialize;
use utoipa::ToSchema;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by tag repository adapters.
    pub enum TagRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "tag repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "tag repository query failed: {message}",
    }
}

/// A tag with the number of visible threads carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    /// Tag name.
    pub name: String,
    /// Number of visible top-level posts tagged with it.
    pub post_count: u64,
}

/// Aggregated tag usage, most used first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Number of tags whose name contains `filter` (case-insensitive).
    async fn count_tags(&self, filter: Option<String>) -> Result<u64, TagRepositoryError>;

    /// The slice of tags whose name contains `filter`, ordered by usage.
    async fn list_tags(
        &self,
        filter: Option<String>,
        window: PageWindow,
    ) -> Result<Vec<TagCount>, TagRepositoryError>;
}
