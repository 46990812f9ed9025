//! Tag directory.

use std::sync::Arc;

use pagination::{Page, PageRequest};

use super::Error;
use super::cached_pagination::CachedPaginator;
use super::ports::{TagCount, TagRepository};

/// Cache key of the unfiltered tag count.
pub const TAGS_CACHE_KEY: &str = "tags";

/// Lists tags with their post counts.
#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagRepository>,
    paginator: CachedPaginator,
}

impl TagService {
    /// Create the service.
    pub fn new(tags: Arc<dyn TagRepository>, paginator: CachedPaginator) -> Self {
        Self { tags, paginator }
    }

    /// One page of tags, optionally filtered by a name fragment.
    ///
    /// Only the unfiltered count is cached.
    pub async fn list(&self, query: Option<&str>, page: PageRequest) -> Result<Page<TagCount>, Error> {
        let filter = query
            .map(|raw| raw.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        let key = if filter.is_some() { "" } else { TAGS_CACHE_KEY };

        let tags = &self.tags;
        let count_filter = filter.clone();
        self.paginator
            .paginate(
                key,
                page,
                move || async move { tags.count_tags(count_filter).await.map_err(Error::from) },
                move |window| async move { tags.list_tags(filter, window).await.map_err(Error::from) },
            )
            .await
    }
}
