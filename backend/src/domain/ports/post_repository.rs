//! Port abstraction for post persistence adapters and their errors.
use async_trait::async_trait;
use pagination::PageWindow;

use crate::domain::listing::PostQuery;
use crate::domain::{NewPost, Post, PostId, PostListing};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
    }
}

/// Storage of posts, their counters and their thread structure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Number of posts matching `query`.
    async fn count(&self, query: &PostQuery) -> Result<u64, PostRepositoryError>;

    /// The slice of posts matching `query` selected by `window`, with authors
    /// and root titles eagerly loaded.
    async fn list(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<PostListing>, PostRepositoryError>;

    /// Fetch a single post.
    async fn find(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Every post of a thread, root first, then replies by creation time.
    async fn thread(&self, root_id: PostId) -> Result<Vec<PostListing>, PostRepositoryError>;

    /// Listings for the given identifiers, in the order given; unknown ids are
    /// skipped.
    async fn listings_by_ids(&self, ids: &[PostId]) -> Result<Vec<PostListing>, PostRepositoryError>;

    /// Insert a post. Replies increment the root's reply counters and refresh
    /// its activity time.
    async fn insert(&self, post: NewPost) -> Result<Post, PostRepositoryError>;

    /// Increment the view counter, returning the stored count afterwards.
    async fn increment_views(&self, id: PostId) -> Result<i32, PostRepositoryError>;

    /// Add `delta` to the vote counter, returning the stored count afterwards.
    async fn adjust_votes(&self, id: PostId, delta: i32) -> Result<i32, PostRepositoryError>;
}
