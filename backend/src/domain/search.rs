//! Full-text search over posts.
//!
//! The index returns post ids ranked by relevance; listings are loaded from
//! the post repository. An unavailable index yields an empty result with a
//! message instead of an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::ports::{PostRepository, SearchIndex};
use super::{Error, PostListing, PostStatus, Viewer};

/// Most hits returned for one query.
pub const SEARCH_LIMIT: usize = 50;

/// Search outcome.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Trimmed query.
    pub query: String,
    /// Matching posts in relevance order.
    pub hits: Vec<PostListing>,
    /// Why the result is empty, when it was not searched.
    pub message: Option<String>,
}

/// Runs searches.
#[derive(Clone)]
pub struct SearchService {
    index: Arc<dyn SearchIndex>,
    posts: Arc<dyn PostRepository>,
    char_min: usize,
}

impl SearchService {
    /// Create the service; queries shorter than `char_min` are not sent.
    pub fn new(index: Arc<dyn SearchIndex>, posts: Arc<dyn PostRepository>, char_min: usize) -> Self {
        Self {
            index,
            posts,
            char_min,
        }
    }

    fn empty(query: String, message: impl Into<String>) -> SearchResults {
        SearchResults {
            query,
            hits: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Search for `raw_query`. Hidden posts are only returned to moderators.
    pub async fn search(&self, viewer: &Viewer, raw_query: &str) -> Result<SearchResults, Error> {
        let query = raw_query.trim().to_owned();
        if query.chars().count() < self.char_min {
            let message = format!("enter at least {} characters to search", self.char_min);
            return Ok(Self::empty(query, message));
        }

        let hits = match self.index.perform_search(&query, SEARCH_LIMIT).await {
            Ok(hits) => hits,
            Err(error) => {
                warn!(%error, "search backend failed");
                return Ok(Self::empty(query, "search is currently unavailable"));
            }
        };
        let ids: Vec<_> = hits.iter().map(|hit| hit.post_id).collect();
        if ids.is_empty() {
            return Ok(SearchResults {
                query,
                hits: Vec::new(),
                message: None,
            });
        }

        let mut listings = self.posts.listings_by_ids(&ids).await?;
        let moderator = viewer.is_moderator();
        listings.retain(|listing| {
            moderator || (!listing.post.spam.is_hidden() && listing.post.status != PostStatus::Deleted)
        });
        listings.sort_by_key(|listing| {
            ids.iter()
                .position(|id| *id == listing.post.id)
                .unwrap_or(usize::MAX)
        });
        Ok(SearchResults {
            query,
            hits: listings,
            message: None,
        })
    }
}
