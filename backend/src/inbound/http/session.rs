//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie session holds the authenticated user id and a short queue of
//! flash messages. Page handlers push messages before redirecting and the next
//! rendered page drains them into its `messages` array.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const FLASH_KEY: &str = "flash";

/// Most flash messages kept between requests; older ones are dropped so the
/// cookie stays small.
pub const FLASH_LIMIT: usize = 8;

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id in the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current user id from the session, if present.
    ///
    /// A tampered or stale value reads as anonymous.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(id.and_then(|raw| match UserId::new(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Drop everything, including pending flash messages.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Queue a message for the next rendered page.
    pub fn flash(&self, message: impl Into<String>) -> Result<(), Error> {
        let mut queue = self.read_flash();
        queue.push(message.into());
        if queue.len() > FLASH_LIMIT {
            let excess = queue.len() - FLASH_LIMIT;
            queue.drain(..excess);
        }
        self.0
            .insert(FLASH_KEY, queue)
            .map_err(|error| Error::internal(format!("failed to store flash message: {error}")))
    }

    /// Remove and return every queued message, oldest first.
    pub fn take_flash(&self) -> Vec<String> {
        let queue = self.read_flash();
        if !queue.is_empty() {
            self.0.remove(FLASH_KEY);
        }
        queue
    }

    fn read_flash(&self) -> Vec<String> {
        match self.0.get::<Vec<String>>(FLASH_KEY) {
            Ok(queue) => queue.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "discarding unreadable flash queue");
                Vec::new()
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
