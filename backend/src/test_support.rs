//! Test utilities for the forum crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via the
//! `test-support` feature).

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::JobHandler;
use crate::domain::{ForumJobHandler, Profile, SignupForm};
use crate::inbound::http::state::{HttpState, HttpStatePorts, HttpTuning};
use crate::outbound::cache::InMemoryCountCache;
use crate::outbound::memory::MemoryForum;
use crate::outbound::queue::InlineDispatcher;
use crate::outbound::security::Argon2CredentialHasher;

/// Password given to members created by [`signup`].
pub const TEST_PASSWORD: &str = "correct horse battery";

/// A clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("duration out of range: {error}; delta={delta:?}"),
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Ports backed entirely by `forum`, with an in-memory count cache and jobs
/// run inline so their effects are visible when a request returns.
pub fn memory_ports(forum: &Arc<MemoryForum>, clock: Arc<dyn Clock>) -> HttpStatePorts {
    let handler: Arc<dyn JobHandler> = Arc::new(ForumJobHandler::new(
        forum.clone(),
        forum.clone(),
        forum.clone(),
        clock.clone(),
    ));
    HttpStatePorts {
        posts: forum.clone(),
        profiles: forum.clone(),
        votes: forum.clone(),
        tags: forum.clone(),
        badges: forum.clone(),
        logs: forum.clone(),
        search: forum.clone(),
        cache: Arc::new(InMemoryCountCache::new(clock.clone())),
        hasher: Arc::new(Argon2CredentialHasher),
        dispatcher: Arc::new(InlineDispatcher::new(handler)),
        clock,
    }
}

/// HTTP state over `forum` with default tuning.
pub fn memory_state(forum: &Arc<MemoryForum>, clock: Arc<dyn Clock>) -> HttpState {
    HttpState::new(memory_ports(forum, clock), HttpTuning::default())
}

/// Register a member whose username is the local part of `email`.
pub async fn signup(state: &HttpState, email: &str) -> Profile {
    state
        .accounts
        .signup(&SignupForm {
            email: email.to_owned(),
            name: None,
            password1: TEST_PASSWORD.to_owned(),
            password2: TEST_PASSWORD.to_owned(),
        })
        .await
        .expect("signup succeeds")
}
