//! Listing use-case: topic parsing, caching keys and pagination.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};

use super::{PostOrder, PostQuery, TimeWindow, Topic};
use crate::domain::cached_pagination::CachedPaginator;
use crate::domain::ports::PostRepository;
use crate::domain::{Error, PostListing, Viewer};

/// Raw listing parameters as received from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRequest {
    /// Topic keyword; empty means latest.
    pub topic: String,
    /// Ordering keyword.
    pub order: Option<String>,
    /// Time window keyword.
    pub limit: Option<String>,
    /// Requested page.
    pub page: PageRequest,
}

/// A rendered listing page and the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Canonical topic keyword.
    pub topic: String,
    /// Canonical ordering keyword.
    pub order: &'static str,
    /// Canonical time window keyword.
    pub limit: &'static str,
    /// The posts.
    pub page: Page<PostListing>,
}

/// Builds and paginates post listings.
#[derive(Clone)]
pub struct PostListingService {
    posts: Arc<dyn PostRepository>,
    paginator: CachedPaginator,
    clock: Arc<dyn Clock>,
}

impl PostListingService {
    /// Create a listing service.
    pub fn new(
        posts: Arc<dyn PostRepository>,
        paginator: CachedPaginator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            paginator,
            clock,
        }
    }

    /// The query selecting the posts `viewer` sees under `topic`.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error when a non-moderator asks for the spam queue.
    pub fn get_posts(
        &self,
        viewer: &Viewer,
        topic: &Topic,
        order: PostOrder,
        window: TimeWindow,
    ) -> Result<PostQuery, Error> {
        let edited_after = window.cutoff(self.clock.utc());
        PostQuery::for_topic(topic, viewer, order, edited_after).map_err(Error::from)
    }

    /// Fetch one page of a listing.
    pub async fn list(&self, viewer: &Viewer, request: &ListingRequest) -> Result<ListingPage, Error> {
        let topic = Topic::parse(&request.topic);
        let order = PostOrder::parse(request.order.as_deref());
        let window = TimeWindow::parse(request.limit.as_deref());
        let query = self.get_posts(viewer, &topic, order, window)?;
        let key = cache_key(&topic, viewer, order, window);

        let posts = &self.posts;
        let query_ref = &query;
        let page = self
            .paginator
            .paginate(
                &key,
                request.page,
                move || async move { posts.count(query_ref).await.map_err(Error::from) },
                move |page_window| async move {
                    posts.list(query_ref, page_window).await.map_err(Error::from)
                },
            )
            .await?;

        Ok(ListingPage {
            topic: topic.keyword(),
            order: order.keyword(),
            limit: window.keyword(),
            page,
        })
    }
}

/// Cache key for a listing's total count.
///
/// Personal topics are keyed per member; the spam queue is never cached so
/// moderators always see a live count.
pub fn cache_key(topic: &Topic, viewer: &Viewer, order: PostOrder, window: TimeWindow) -> String {
    let order = order.keyword();
    let limit = window.keyword();
    match (topic, viewer.profile()) {
        (Topic::Spam, _) => String::new(),
        (topic, Some(profile)) if topic.is_personal() => {
            format!("{}-{}-{limit}", topic.keyword(), profile.uid)
        }
        (topic, None) if topic.is_personal() => format!("latest-{order}-{limit}"),
        (Topic::Latest, _) => format!("latest-{order}-{limit}"),
        (topic, _) => format!("{}-{order}-{limit}", topic.keyword()),
    }
}
