//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::Utc;
use serde_json::json;

use crate::domain::{Profile, Role};
use crate::outbound::memory::MemoryForum;
use crate::test_support::{MutableClock, TEST_PASSWORD, memory_state, signup};

use super::configure;
use super::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// An in-memory forum with the HTTP state built over it.
pub struct TestForum {
    pub forum: Arc<MemoryForum>,
    pub clock: Arc<MutableClock>,
    pub state: HttpState,
}

impl TestForum {
    pub fn new() -> Self {
        let forum = Arc::new(MemoryForum::new());
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let state = memory_state(&forum, clock.clone());
        Self {
            forum,
            clock,
            state,
        }
    }

    /// Sign up a member; `moderator` promotes them.
    pub async fn member(&self, email: &str, moderator: bool) -> Profile {
        let mut profile = signup(&self.state, email).await;
        if moderator {
            assert!(self.forum.set_role(profile.user_id, Role::Moderator));
            profile.role = Role::Moderator;
        }
        profile
    }
}

/// The session cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
}

/// Every forum route over `state`, behind a test session middleware.
pub async fn test_app(
    state: HttpState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(web::Data::new(state))
            .configure(configure),
    )
    .await
}

/// Log `username` in through the JSON endpoint and return the session cookie.
pub async fn login_cookie<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/accounts/login")
        .set_json(json!({ "username": username, "password": TEST_PASSWORD }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "login failed with {}", res.status());
    session_cookie(&res).expect("login sets a session cookie")
}

/// The `Location` header of a redirect.
pub fn redirect_location<B>(res: &ServiceResponse<B>) -> Option<String> {
    res.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
