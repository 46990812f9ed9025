//! Account handlers: sign-up, login, logout, profiles and member moderation.
//!
//! ```text
//! POST /accounts/login {"username":"ada","password":"correct horse"}
//! POST /accounts/signup email=...&password1=...&password2=...
//! GET  /u/{uid}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    ApiResult, AuthorSummary, Error, LoginCredentials, LoginValidationError, Profile, ProfileForm,
    ProfileUid, SignupForm, UserModerationForm, Viewer,
};

use super::page::{PageOutcome, flash, respond, see_other};
use super::session::SessionContext;
use super::state::HttpState;

/// Login request body for `POST /accounts/login`.
///
/// Example JSON:
/// `{"username":"ada","password":"correct horse"}`
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate a member and establish a session.
#[utoipa::path(
    post,
    path = "/accounts/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthorSummary,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 403, description = "Banned account", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/accounts/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthorSummary>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let profile = state.accounts.login(&credentials).await?;
    session.persist_user(&profile.user_id)?;
    Ok(web::Json(profile.summary()))
}

/// What the login page shows.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPage {
    /// The member already logged in, if any.
    pub current: Option<AuthorSummary>,
}

/// Login page; unauthenticated page requests land here.
#[utoipa::path(
    get,
    path = "/accounts/login",
    responses((status = 200, description = "Login page", body = LoginPage)),
    tags = ["accounts"],
    operation_id = "loginPage",
    security([])
)]
#[get("/accounts/login")]
pub async fn login_page(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    let result: ApiResult<PageOutcome<LoginPage>> = async {
        let viewer = state.viewer(&session).await?;
        Ok(PageOutcome::Render(LoginPage {
            current: viewer.profile().map(Profile::summary),
        }))
    }
    .await;
    respond(&session, "/", result)
}

/// Register a member and log them in.
#[utoipa::path(
    post,
    path = "/accounts/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the new profile, or back with errors flashed")),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
#[post("/accounts/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<SignupForm>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<()>> = async {
        let profile = state.accounts.signup(&form).await?;
        session.persist_user(&profile.user_id)?;
        flash(&session, format!("welcome, {}", profile.name));
        Ok(PageOutcome::Redirect(format!("/u/{}", profile.uid)))
    }
    .await;
    respond(&session, super::error::LOGIN_PATH, result)
}

/// End the session.
#[utoipa::path(
    post,
    path = "/accounts/logout",
    responses((status = 303, description = "Redirect home")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/accounts/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    see_other("/")
}

/// A member profile as seen by the viewer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub profile: Profile,
    /// Whether the viewer may change this member's state.
    pub can_moderate: bool,
}

fn can_moderate(viewer: &Viewer, target: &Profile) -> bool {
    viewer.profile().is_some_and(|actor| {
        actor.is_moderator()
            && actor.user_id != target.user_id
            && (!target.is_moderator() || actor.is_manager())
    })
}

/// Public profile page.
#[utoipa::path(
    get,
    path = "/u/{uid}",
    params(("uid" = String, Path, description = "Profile uid")),
    responses(
        (status = 200, description = "Profile document", body = ProfilePage),
        (status = 303, description = "Unknown member; redirected home")
    ),
    tags = ["accounts"],
    operation_id = "viewProfile",
    security([])
)]
#[get("/u/{uid}")]
pub async fn view_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<ProfilePage>> = async {
        let viewer = state.viewer(&session).await?;
        let profile = state.accounts.profile(&path).await?;
        Ok(PageOutcome::Render(ProfilePage {
            can_moderate: can_moderate(&viewer, &profile),
            profile,
        }))
    }
    .await;
    respond(&session, "/", result)
}

/// Edit the viewer's display name and watched tags.
#[utoipa::path(
    post,
    path = "/accounts/edit",
    request_body(content = ProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the profile")),
    tags = ["accounts"],
    operation_id = "editProfile"
)]
#[post("/accounts/edit")]
pub async fn edit_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<ProfileForm>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<()>> = async {
        let viewer = state.viewer(&session).await?;
        let profile = state.accounts.update_details(&viewer, &form).await?;
        flash(&session, "profile updated");
        Ok(PageOutcome::Redirect(format!("/u/{}", profile.uid)))
    }
    .await;
    respond(&session, "/", result)
}

/// Change a member's moderation state.
#[utoipa::path(
    post,
    path = "/accounts/moderate/{uid}",
    params(("uid" = String, Path, description = "Target profile uid")),
    request_body(content = UserModerationForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the target profile")),
    tags = ["moderation"],
    operation_id = "moderateUser"
)]
#[post("/accounts/moderate/{uid}")]
pub async fn moderate_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: web::Form<UserModerationForm>,
) -> HttpResponse {
    let fallback = format!("/u/{}", path.as_str());
    let result: ApiResult<PageOutcome<()>> = async {
        let uid = ProfileUid::new(path.as_str())
            .ok_or_else(|| Error::not_found("user does not exist"))?;
        let viewer = state.viewer(&session).await?;
        let target = state.moderation.moderate_user(&viewer, &uid, &form).await?;
        info!(target = %target.user_id, state = target.state.label(), "member moderated");
        flash(
            &session,
            format!("{} is now {}", target.name, target.state.label()),
        );
        Ok(PageOutcome::Redirect(format!("/u/{}", target.uid)))
    }
    .await;
    respond(&session, &fallback, result)
}
