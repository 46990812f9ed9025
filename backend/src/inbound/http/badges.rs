//! Badge pages.
//!
//! ```text
//! GET /badges
//! GET /badges/{id}?user=1a2b3c4d&page=2
//! ```

use actix_web::{HttpResponse, get, web};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ApiResult, BadgeDetail, BadgeId, BadgeWithCount, Error};

use super::page::{PageOutcome, respond};
use super::session::SessionContext;
use super::state::HttpState;

/// Every badge with its award count.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeList {
    pub badges: Vec<BadgeWithCount>,
}

/// Badge list page.
#[utoipa::path(
    get,
    path = "/badges",
    responses((status = 200, description = "Badges", body = BadgeList)),
    tags = ["badges"],
    operation_id = "listBadges",
    security([])
)]
#[get("/badges")]
pub async fn list_badges(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    let result: ApiResult<PageOutcome<BadgeList>> = async {
        let badges = state.badges.list().await?;
        Ok(PageOutcome::Render(BadgeList { badges }))
    }
    .await;
    respond(&session, "/", result)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BadgeParams {
    /// Only show awards of this member.
    pub user: Option<String>,
    /// One-based page number.
    pub page: Option<String>,
}

/// A badge with one page of its awards.
#[utoipa::path(
    get,
    path = "/badges/{id}",
    params(("id" = i64, Path, description = "Badge identifier"), BadgeParams),
    responses(
        (status = 200, description = "Badge detail", body = BadgeDetail),
        (status = 303, description = "Unknown badge or member; redirected to the badge list")
    ),
    tags = ["badges"],
    operation_id = "viewBadge",
    security([])
)]
#[get("/badges/{id}")]
pub async fn view_badge(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    params: web::Query<BadgeParams>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<BadgeDetail>> = async {
        let badge_id: BadgeId = path
            .parse()
            .map_err(|_| Error::not_found("badge does not exist"))?;
        let detail = state
            .badges
            .view(
                badge_id,
                params.user.as_deref(),
                PageRequest::parse(params.page.as_deref()),
            )
            .await?;
        Ok(PageOutcome::Render(detail))
    }
    .await;
    respond(&session, "/badges", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::BadgeRepository;
    use crate::domain::{AWARD_DEFINITIONS, ProfileUid, seed_badges};
    use crate::inbound::http::test_utils::{TestForum, redirect_location, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::Value;

    async fn seeded() -> (TestForum, BadgeId, ProfileUid) {
        let forum = TestForum::new();
        let badges = seed_badges(forum.forum.as_ref(), AWARD_DEFINITIONS)
            .await
            .expect("seeded");
        let ada = forum.member("ada@example.org", false).await;
        let bob = forum.member("bob@example.org", false).await;
        let student = badges[1].id;
        for member in [&ada, &bob] {
            forum
                .forum
                .grant(student, member.user_id, None, Utc::now())
                .await
                .expect("granted");
        }
        (forum, student, ada.uid)
    }

    #[rstest]
    #[actix_web::test]
    async fn lists_every_badge_with_counts() {
        let (forum, student, _) = seeded().await;
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/badges").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        let badges = body["badges"].as_array().cloned().unwrap_or_default();
        assert_eq!(badges.len(), AWARD_DEFINITIONS.len());
        let awarded = badges
            .iter()
            .find(|badge| badge["id"] == student)
            .expect("student listed");
        assert_eq!(awarded["name"], "Student");
        assert_eq!(awarded["awardCount"], 2);
    }

    #[rstest]
    #[actix_web::test]
    async fn filters_awards_by_member() {
        let (forum, student, uid) = seeded().await;
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/badges/{student}")).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["awards"]["totalCount"], 2);
        assert_eq!(body["user"], Value::Null);
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/badges/{student}?user={uid}"))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["awards"]["totalCount"], 1);
        assert_eq!(body["user"], uid.as_str());
    }

    #[rstest]
    #[case("/badges/999")]
    #[case("/badges/not-a-number")]
    #[actix_web::test]
    async fn unknown_badges_redirect_to_the_list(#[case] uri: &str) {
        let (forum, _, _) = seeded().await;
        let app = test_app(forum.state.clone()).await;

        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location(&res).as_deref(), Some("/badges"));
    }
}
