//! Listing pages.
//!
//! ```text
//! GET /?page=2&order=votes&limit=week
//! GET /t/{topic}
//! GET /me/{bookmarks,following,posts,tags,votes}
//! GET /tags?query=rust
//! GET /community?order=reputation&query=ada
//! GET /search?query=borrow+checker
//! ```

use actix_web::{HttpResponse, get, web};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::domain::ports::TagCount;
use crate::domain::{
    ApiResult, CommunityRequest, Error, ListingRequest, PostListing, Profile, SearchResults,
    require_member,
};

use super::page::{PageOutcome, flash, respond};
use super::session::SessionContext;
use super::state::HttpState;

/// Query parameters shared by post listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingParams {
    /// One-based page; anything unparsable selects the first page.
    pub page: Option<String>,
    /// `rank`, `views`, `replies`, `votes`, `creation` or `activity`.
    pub order: Option<String>,
    /// `today`, `week`, `month`, `year` or `all`.
    pub limit: Option<String>,
}

impl ListingParams {
    fn request(&self, topic: &str) -> ListingRequest {
        ListingRequest {
            topic: topic.to_owned(),
            order: self.order.clone(),
            limit: self.limit.clone(),
            page: PageRequest::parse(self.page.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingDocument {
    topic: String,
    order: &'static str,
    limit: &'static str,
    #[serde(flatten)]
    page: Page<PostListing>,
}

async fn listing(
    state: &HttpState,
    session: &SessionContext,
    topic: &str,
    params: &ListingParams,
) -> ApiResult<PageOutcome<ListingDocument>> {
    let viewer = state.viewer(session).await?;
    let listing = state.listings.list(&viewer, &params.request(topic)).await?;
    Ok(PageOutcome::Render(ListingDocument {
        topic: listing.topic,
        order: listing.order,
        limit: listing.limit,
        page: listing.page,
    }))
}

/// Latest posts.
#[utoipa::path(
    get,
    path = "/",
    params(ListingParams),
    responses(
        (status = 200, description = "Listing document"),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["posts"],
    operation_id = "latestPosts",
    security([])
)]
#[get("/")]
pub async fn latest(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ListingParams>,
) -> HttpResponse {
    let result = listing(&state, &session, "", &params).await;
    respond(&session, "/", result)
}

/// Posts under a topic keyword or tag. The spam queue is moderator only.
#[utoipa::path(
    get,
    path = "/t/{topic}",
    params(("topic" = String, Path, description = "Topic keyword or tag"), ListingParams),
    responses(
        (status = 200, description = "Listing document"),
        (status = 303, description = "Topic refused; message flashed")
    ),
    tags = ["posts"],
    operation_id = "topicPosts",
    security([])
)]
#[get("/t/{topic}")]
pub async fn topic_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    params: web::Query<ListingParams>,
) -> HttpResponse {
    let result = listing(&state, &session, &path, &params).await;
    respond(&session, "/", result)
}

fn personal_topic(kind: &str) -> Option<&'static str> {
    match kind {
        "bookmarks" => Some("bookmarks"),
        "following" => Some("following"),
        "posts" => Some("myposts"),
        "tags" => Some("mytags"),
        "votes" => Some("myvotes"),
        _ => None,
    }
}

/// The logged-in member's own listings.
#[utoipa::path(
    get,
    path = "/me/{kind}",
    params(
        ("kind" = String, Path, description = "bookmarks, following, posts, tags or votes"),
        ListingParams
    ),
    responses(
        (status = 200, description = "Listing document"),
        (status = 303, description = "Login required or unknown listing")
    ),
    tags = ["posts"],
    operation_id = "myPosts"
)]
#[get("/me/{kind}")]
pub async fn personal(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    params: web::Query<ListingParams>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<ListingDocument>> = async {
        let viewer = state.viewer(&session).await?;
        require_member(&viewer)?;
        let topic = personal_topic(&path).ok_or_else(|| Error::not_found("no such listing"))?;
        listing(&state, &session, topic, &params).await
    }
    .await;
    respond(&session, "/", result)
}

/// Query parameters for the tag list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagParams {
    /// Substring filter.
    pub query: Option<String>,
    /// One-based page.
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
struct TagDocument {
    query: String,
    #[serde(flatten)]
    page: Page<TagCount>,
}

/// Tags with the number of visible posts carrying them.
#[utoipa::path(
    get,
    path = "/tags",
    params(TagParams),
    responses((status = 200, description = "Tag list document")),
    tags = ["posts"],
    operation_id = "listTags",
    security([])
)]
#[get("/tags")]
pub async fn list_tags(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<TagParams>,
) -> HttpResponse {
    let query = params.query.as_deref().unwrap_or_default().trim().to_owned();
    let filter = (!query.is_empty()).then_some(query.as_str());
    let listed = state
        .tags
        .list(filter, PageRequest::parse(params.page.as_deref()))
        .await;
    let result = listed.map(|page| {
        PageOutcome::Render(TagDocument {
            query: query.clone(),
            page,
        })
    });
    respond(&session, "/", result)
}

/// Query parameters for the member directory.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommunityParams {
    /// `visit`, `reputation` or `joined`.
    pub order: Option<String>,
    /// Last login window: `today`, `week`, `month`, `year` or `all`.
    pub limit: Option<String>,
    /// Name filter.
    pub query: Option<String>,
    /// One-based page.
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommunityDocument {
    #[serde(flatten)]
    page: Page<Profile>,
}

/// Member directory.
#[utoipa::path(
    get,
    path = "/community",
    params(CommunityParams),
    responses((status = 200, description = "Member directory document")),
    tags = ["accounts"],
    operation_id = "community",
    security([])
)]
#[get("/community")]
pub async fn community(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<CommunityParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let request = CommunityRequest {
        order: params.order,
        limit: params.limit,
        query: params.query,
        page: PageRequest::parse(params.page.as_deref()),
    };
    let result = state
        .community
        .list(&request)
        .await
        .map(|page| PageOutcome::Render(CommunityDocument { page }));
    respond(&session, "/", result)
}

/// Query parameters for search.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free-text query.
    pub query: Option<String>,
}

/// Full-text search. A failing search backend yields an empty result and a
/// flashed explanation.
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses((status = 200, description = "Search results document")),
    tags = ["posts"],
    operation_id = "search",
    security([])
)]
#[get("/search")]
pub async fn search(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<SearchResults>> = async {
        let viewer = state.viewer(&session).await?;
        let mut results: SearchResults = state
            .search
            .search(&viewer, params.query.as_deref().unwrap_or_default())
            .await?;
        if let Some(message) = results.message.take() {
            flash(&session, message);
        }
        Ok(PageOutcome::Render(results))
    }
    .await;
    respond(&session, "/", result)
}
