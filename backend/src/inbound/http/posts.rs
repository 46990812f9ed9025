//! Thread pages, authoring and voting.
//!
//! ```text
//! GET  /p/{id}
//! POST /p/{id}      content=...
//! POST /new         title=...&content=...&postType=question&tags=rust
//! POST /vote/{id}   {"voteType":"upvote"}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    AnswerForm, ApiResult, Error, PostForm, PostId, SpamStatus, Thread, ThreadLookup, Viewer,
    VoteOutcome, VoteType,
};

use super::page::{PageOutcome, flash, respond};
use super::session::SessionContext;
use super::state::HttpState;

const AWAITING_MODERATION: &str = "your post is awaiting moderation";

fn parse_post_id(raw: &str) -> ApiResult<PostId> {
    PostId::parse(raw).ok_or_else(|| Error::not_found("post does not exist"))
}

/// Key identifying the viewer for view counting: the member id, or the client
/// address for anonymous visitors.
fn viewer_key(viewer: &Viewer, req: &HttpRequest) -> String {
    match viewer.profile() {
        Some(profile) => profile.user_id.to_string(),
        None => req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("anonymous")
            .to_owned(),
    }
}

/// A thread with the replies visible to the viewer.
#[utoipa::path(
    get,
    path = "/p/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Thread document", body = Thread),
        (status = 303, description = "Reply id; redirected to its thread"),
        (status = 404, description = "Hidden from this viewer", body = Error)
    ),
    tags = ["posts"],
    operation_id = "viewThread",
    security([])
)]
#[get("/p/{id}")]
pub async fn view_thread(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<Thread>> = async {
        let post_id = parse_post_id(&path)?;
        let viewer = state.viewer(&session).await?;
        let key = viewer_key(&viewer, &req);
        Ok(match state.posting.view_thread(&viewer, post_id, &key).await? {
            ThreadLookup::Found(thread) => PageOutcome::Render(thread),
            ThreadLookup::Moved(root) => PageOutcome::Redirect(format!("/p/{root}")),
            ThreadLookup::Hidden => PageOutcome::NotFound,
        })
    }
    .await;
    respond(&session, "/", result)
}

/// Reply to a post.
#[utoipa::path(
    post,
    path = "/p/{id}",
    params(("id" = String, Path, description = "Parent post identifier")),
    request_body(content = AnswerForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the thread")),
    tags = ["posts"],
    operation_id = "createAnswer"
)]
#[post("/p/{id}")]
pub async fn create_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: web::Form<AnswerForm>,
) -> HttpResponse {
    let fallback = format!("/p/{}", path.as_str());
    let result: ApiResult<PageOutcome<()>> = async {
        let parent_id = parse_post_id(&path)?;
        let viewer = state.viewer(&session).await?;
        let answer = state.posting.create_answer(&viewer, parent_id, &form).await?;
        if answer.spam == SpamStatus::Quarantined {
            flash(&session, AWAITING_MODERATION);
        }
        Ok(PageOutcome::Redirect(format!("/p/{}", answer.thread_root())))
    }
    .await;
    respond(&session, &fallback, result)
}

/// Open a new thread.
#[utoipa::path(
    post,
    path = "/new",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the new thread, or home with errors flashed")),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/new")]
pub async fn create_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<PostForm>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<()>> = async {
        let viewer = state.viewer(&session).await?;
        let post = state.posting.create_post(&viewer, &form).await?;
        if post.spam == SpamStatus::Quarantined {
            flash(&session, AWAITING_MODERATION);
        }
        Ok(PageOutcome::Redirect(format!("/p/{}", post.id)))
    }
    .await;
    respond(&session, "/", result)
}

/// Vote request body for `POST /vote/{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// `upvote`, `bookmark` or `accept`.
    pub vote_type: String,
}

/// Add or withdraw a vote. Answers with the new vote count.
#[utoipa::path(
    post,
    path = "/vote/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote toggled", body = VoteOutcome),
        (status = 400, description = "Invalid vote", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Not allowed", body = Error),
        (status = 404, description = "Post not found", body = Error)
    ),
    tags = ["posts"],
    operation_id = "vote"
)]
#[post("/vote/{id}")]
pub async fn cast_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VoteRequest>,
) -> ApiResult<web::Json<VoteOutcome>> {
    let vote_type: VoteType = payload.vote_type.parse().map_err(|message: String| {
        Error::invalid_request(message).with_details(json!({ "field": "voteType" }))
    })?;
    let post_id = parse_post_id(&path)?;
    let viewer = state.viewer(&session).await?;
    let outcome = state.posting.toggle_vote(&viewer, post_id, vote_type).await?;
    Ok(web::Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Post, PostType};
    use crate::inbound::http::test_utils::{
        TestForum, login_cookie, redirect_location, session_cookie, test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::Value;

    async fn thread(forum: &TestForum) -> Post {
        let author = forum.member("ada@example.org", true).await;
        forum
            .state
            .posting
            .create_post(
                &Viewer::Member(author),
                &PostForm {
                    title: "How do lifetimes work?".to_owned(),
                    content: "I keep fighting the borrow checker.".to_owned(),
                    post_type: String::new(),
                    tags: "rust".to_owned(),
                },
            )
            .await
            .expect("post created")
    }

    #[rstest]
    #[actix_web::test]
    async fn anonymous_visitors_read_open_threads() {
        let forum = TestForum::new();
        let post = thread(&forum).await;
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/p/{}", post.id)).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["root"]["title"], "How do lifetimes work?");
        assert_eq!(body["root"]["postType"], "question");
        assert_eq!(body["replies"], Value::Array(vec![]));
    }

    #[rstest]
    #[actix_web::test]
    async fn spam_threads_are_not_found_for_anonymous_visitors() {
        let forum = TestForum::new();
        let post = thread(&forum).await;
        let moderator = Viewer::Member(forum.member("mod@example.org", true).await);
        forum
            .state
            .moderation
            .mark_spam(&moderator, post.id, false)
            .await
            .expect("marked");
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/p/{}", post.id)).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_ids_redirect_home() {
        let forum = TestForum::new();
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/p/not-a-post").to_request()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location(&res).as_deref(), Some("/"));
    }

    #[rstest]
    #[actix_web::test]
    async fn new_members_posts_are_quarantined_with_a_notice() {
        let forum = TestForum::new();
        forum.member("bob@example.org", false).await;
        let app = test_app(forum.state.clone()).await;
        let cookie = login_cookie(&app, "bob").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/new")
                .cookie(cookie)
                .set_form([
                    ("title", "Which async runtime to pick?"),
                    ("content", "Tokio, smol or async-std for a CLI?"),
                    ("postType", "question"),
                    ("tags", "async rust"),
                ])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let location = redirect_location(&res).expect("location");
        assert!(location.starts_with("/p/"));
        let cookie = session_cookie(&res).expect("flash stored");

        let home = test::call_service(&app, test::TestRequest::get().uri("/").cookie(cookie).to_request()).await;
        let body: Value = test::read_body_json(home).await;
        assert_eq!(body["messages"][0], AWAITING_MODERATION);
        assert_eq!(body["totalCount"], 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_posts_flash_form_errors() {
        let forum = TestForum::new();
        forum.member("ada@example.org", true).await;
        let app = test_app(forum.state.clone()).await;
        let cookie = login_cookie(&app, "ada").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/new")
                .cookie(cookie)
                .set_form([("title", "short"), ("content", "tiny"), ("tags", "")])
                .to_request(),
        )
        .await;
        assert_eq!(redirect_location(&res).as_deref(), Some("/"));
        let cookie = session_cookie(&res).expect("flash stored");
        let home = test::call_service(&app, test::TestRequest::get().uri("/").cookie(cookie).to_request()).await;
        let body: Value = test::read_body_json(home).await;
        let messages = body["messages"].as_array().cloned().unwrap_or_default();
        assert_eq!(messages.len(), 3);
    }

    #[rstest]
    #[actix_web::test]
    async fn answers_redirect_to_the_thread() {
        let forum = TestForum::new();
        let post = thread(&forum).await;
        let app = test_app(forum.state.clone()).await;
        let cookie = login_cookie(&app, "ada").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/p/{}", post.id))
                .cookie(cookie)
                .set_form([("content", "Lifetimes name the scope of a borrow.")])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location(&res), Some(format!("/p/{}", post.id)));

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/p/{}", post.id)).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["replies"][0]["postType"], "answer");
        assert_eq!(body["root"]["answerCount"], 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn votes_toggle_and_report_counts() {
        let forum = TestForum::new();
        let post = thread(&forum).await;
        forum.member("bob@example.org", false).await;
        let app = test_app(forum.state.clone()).await;
        let cookie = login_cookie(&app, "bob").await;
        let vote = |cookie| {
            test::TestRequest::post()
                .uri(&format!("/vote/{}", post.id))
                .cookie(cookie)
                .set_json(json!({ "voteType": "upvote" }))
                .to_request()
        };

        let res = test::call_service(&app, vote(cookie.clone())).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "toggle": "added", "voteCount": 1 }));

        let res = test::call_service(&app, vote(cookie)).await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["toggle"], "removed");
        assert_eq!(body["voteCount"], 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn votes_require_login_and_a_known_type() {
        let forum = TestForum::new();
        let post = thread(&forum).await;
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/vote/{}", post.id))
                .set_json(json!({ "voteType": "upvote" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/vote/{}", post.id))
                .set_json(json!({ "voteType": "downvote" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(post.post_type, PostType::Question);
    }
}
