//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every forum route, the schemas their documents are
//! built from and the session cookie security scheme. Swagger UI serves it
//! at `/docs` in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AnswerForm, AuthorSummary, AwardRecord, Badge, BadgeDetail, BadgeKind, BadgeWithCount, Error,
    ErrorCode, ModerationLog, Post, PostForm, PostListing, PostModerationForm, PostStatus,
    PostType, Profile, ProfileForm, ProfileState, Role, SignupForm, SpamStatus, Thread,
    UserModerationForm, VoteOutcome, VoteToggle,
};
use crate::inbound::http::accounts::{LoginPage, LoginRequest, ProfilePage};
use crate::inbound::http::badges::BadgeList;
use crate::inbound::http::health::{HealthReport, HealthStatus};
use crate::inbound::http::moderation::LogList;
use crate::inbound::http::posts::VoteRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /accounts/login or /accounts/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the forum.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Forum API",
        description = "Community questions and answers: listings, threads, votes, moderation and badges.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::listings::latest,
        crate::inbound::http::listings::topic_posts,
        crate::inbound::http::listings::personal,
        crate::inbound::http::listings::list_tags,
        crate::inbound::http::listings::community,
        crate::inbound::http::listings::search,
        crate::inbound::http::posts::view_thread,
        crate::inbound::http::posts::create_answer,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::cast_vote,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::login_page,
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::view_profile,
        crate::inbound::http::accounts::edit_profile,
        crate::inbound::http::accounts::moderate_user,
        crate::inbound::http::badges::list_badges,
        crate::inbound::http::badges::view_badge,
        crate::inbound::http::moderation::moderate_post,
        crate::inbound::http::moderation::mark_spam,
        crate::inbound::http::moderation::release_quarantine,
        crate::inbound::http::moderation::moderation_logs,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error, ErrorCode, Post, PostListing, PostType, PostStatus, SpamStatus, Thread,
        AuthorSummary, Profile, ProfileState, Role, VoteOutcome, VoteToggle, VoteRequest,
        LoginRequest, LoginPage, ProfilePage, Badge, BadgeKind, BadgeWithCount, BadgeDetail,
        AwardRecord, BadgeList, ModerationLog, LogList, HealthReport, HealthStatus, PostForm,
        AnswerForm, SignupForm, ProfileForm, UserModerationForm, PostModerationForm
    )),
    tags(
        (name = "posts", description = "Listings, threads and votes"),
        (name = "accounts", description = "Sign-up, login and profiles"),
        (name = "badges", description = "Badges and awards"),
        (name = "moderation", description = "Moderator actions and the moderation log"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
