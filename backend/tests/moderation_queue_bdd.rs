//! Behaviour tests for the moderation queue.
//!
//! These scenarios drive the domain services over the in-memory adapters:
//! newcomers' posts start quarantined, moderators release or mark them as
//! spam, and listings and thread views follow.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use forum::domain::ports::ProfileRepository;
use forum::domain::{
    DEFAULT_COUNT_TTL, Error, ErrorCode, ListingRequest, PostForm, PostId, Profile, Role,
    SpamStatus, ThreadLookup, Viewer,
};
use forum::inbound::http::state::HttpState;
use forum::outbound::memory::MemoryForum;
use forum::test_support::{MutableClock, memory_state, signup};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

struct ModerationWorld {
    runtime: Runtime,
    local: LocalSet,
    forum: Arc<MemoryForum>,
    clock: Arc<MutableClock>,
    state: HttpState,
    moderator: RefCell<Option<Profile>>,
    newcomer: RefCell<Option<Profile>>,
    question: RefCell<Option<PostId>>,
    last_error: RefCell<Option<Error>>,
}

impl ModerationWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let forum = Arc::new(MemoryForum::new());
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let state = memory_state(&forum, clock.clone());
        Self {
            runtime,
            local: LocalSet::new(),
            forum,
            clock,
            state,
            moderator: RefCell::new(None),
            newcomer: RefCell::new(None),
            question: RefCell::new(None),
            last_error: RefCell::new(None),
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }

    fn moderator(&self) -> Viewer {
        Viewer::Member(self.moderator.borrow().clone().expect("moderator registered"))
    }

    fn newcomer(&self) -> Profile {
        let user_id = self
            .newcomer
            .borrow()
            .as_ref()
            .expect("newcomer registered")
            .user_id;
        self.block_on(self.forum.find_by_user(user_id))
            .expect("profile lookup")
            .expect("newcomer stored")
    }

    fn question(&self) -> PostId {
        self.question.borrow().expect("question asked")
    }

    fn spam_status(&self) -> SpamStatus {
        let id = self.question();
        let lookup = self.block_on(self.state.posting.view_thread(
            &self.moderator(),
            id,
            "moderator",
        ));
        match lookup.expect("thread lookup") {
            ThreadLookup::Found(thread) => thread.root.post.spam,
            other => panic!("moderators see every thread, got {other:?}"),
        }
    }

    fn listing_total(&self, viewer: &Viewer, topic: &str) -> u64 {
        let request = ListingRequest {
            topic: topic.to_owned(),
            ..ListingRequest::default()
        };
        self.block_on(self.state.listings.list(viewer, &request))
            .expect("listing")
            .page
            .total_count()
    }

    fn log_count(&self) -> usize {
        self.block_on(self.state.moderation.recent_logs(&self.moderator()))
            .expect("moderation log")
            .len()
    }
}

#[fixture]
fn world() -> ModerationWorld {
    ModerationWorld::new()
}

#[given("a moderator and a newcomer")]
fn a_moderator_and_a_newcomer(world: &ModerationWorld) {
    let mut moderator = world.block_on(signup(&world.state, "mod@example.com"));
    assert!(world.forum.set_role(moderator.user_id, Role::Moderator));
    moderator.role = Role::Moderator;
    let newcomer = world.block_on(signup(&world.state, "bob@example.com"));
    *world.moderator.borrow_mut() = Some(moderator);
    *world.newcomer.borrow_mut() = Some(newcomer);
}

#[when("the newcomer asks a question")]
fn the_newcomer_asks_a_question(world: &ModerationWorld) {
    let form = PostForm {
        title: "How do lifetimes interact with async blocks?".to_owned(),
        content: "The borrow checker rejects my future and I do not see why.".to_owned(),
        post_type: "question".to_owned(),
        tags: "rust async".to_owned(),
    };
    let author = Viewer::Member(world.newcomer());
    let post = world
        .block_on(world.state.posting.create_post(&author, &form))
        .expect("question accepted");
    *world.question.borrow_mut() = Some(post.id);
}

#[when("the moderator releases the question")]
fn the_moderator_releases_the_question(world: &ModerationWorld) {
    world
        .block_on(
            world
                .state
                .moderation
                .release_quarantine(&world.moderator(), world.question()),
        )
        .expect("release");
}

#[when("the moderator marks the question as spam")]
fn the_moderator_marks_the_question_as_spam(world: &ModerationWorld) {
    let decision = world
        .block_on(
            world
                .state
                .moderation
                .mark_spam(&world.moderator(), world.question(), false),
        )
        .expect("mark spam");
    assert!(decision.changed);
}

#[when("the moderator restores the question")]
fn the_moderator_restores_the_question(world: &ModerationWorld) {
    let decision = world
        .block_on(
            world
                .state
                .moderation
                .mark_spam(&world.moderator(), world.question(), true),
        )
        .expect("restore");
    assert!(decision.changed);
}

#[when("the newcomer tries to mark the question as spam")]
fn the_newcomer_tries_to_mark_the_question_as_spam(world: &ModerationWorld) {
    let member = Viewer::Member(world.newcomer());
    let outcome = world.block_on(world.state.moderation.mark_spam(&member, world.question(), false));
    *world.last_error.borrow_mut() = outcome.err();
}

#[when("the cached counts expire")]
fn the_cached_counts_expire(world: &ModerationWorld) {
    world.clock.advance(DEFAULT_COUNT_TTL * 2);
}

#[then("the question is quarantined")]
fn the_question_is_quarantined(world: &ModerationWorld) {
    assert_eq!(world.spam_status(), SpamStatus::Quarantined);
}

#[then("anonymous visitors can not see the question")]
fn anonymous_visitors_can_not_see_the_question(world: &ModerationWorld) {
    let lookup = world
        .block_on(
            world
                .state
                .posting
                .view_thread(&Viewer::Anonymous, world.question(), "10.0.0.1"),
        )
        .expect("thread lookup");
    assert!(matches!(lookup, ThreadLookup::Hidden));
}

#[then("anonymous visitors can see the question")]
fn anonymous_visitors_can_see_the_question(world: &ModerationWorld) {
    let lookup = world
        .block_on(
            world
                .state
                .posting
                .view_thread(&Viewer::Anonymous, world.question(), "10.0.0.1"),
        )
        .expect("thread lookup");
    assert!(matches!(lookup, ThreadLookup::Found(_)));
}

#[then("the latest listing counts {count} posts")]
fn the_latest_listing_counts(world: &ModerationWorld, count: u64) {
    assert_eq!(world.listing_total(&Viewer::Anonymous, ""), count);
}

#[then("the spam queue lists {count} posts")]
fn the_spam_queue_lists(world: &ModerationWorld, count: u64) {
    assert_eq!(world.listing_total(&world.moderator(), "spam"), count);
}

#[then("the newcomer has a score of {score}")]
fn the_newcomer_has_a_score_of(world: &ModerationWorld, score: i32) {
    assert_eq!(world.newcomer().score, score);
}

#[then("the moderation log has {count} entries")]
fn the_moderation_log_has_entries(world: &ModerationWorld, count: usize) {
    assert_eq!(world.log_count(), count);
}

#[then("the attempt is forbidden")]
fn the_attempt_is_forbidden(world: &ModerationWorld) {
    let error = world.last_error.borrow();
    let error = error.as_ref().expect("the attempt should fail");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[scenario(
    path = "tests/features/moderation_queue.feature",
    name = "A newcomer's question waits for release"
)]
fn a_newcomers_question_waits_for_release(world: ModerationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/moderation_queue.feature",
    name = "Listing counts refresh once the cached count expires"
)]
fn listing_counts_refresh_once_the_cached_count_expires(world: ModerationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/moderation_queue.feature",
    name = "Spam is hidden until restored"
)]
fn spam_is_hidden_until_restored(world: ModerationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/moderation_queue.feature",
    name = "Releasing twice bumps the author once"
)]
fn releasing_twice_bumps_the_author_once(world: ModerationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/moderation_queue.feature",
    name = "Members can not moderate"
)]
fn members_can_not_moderate(world: ModerationWorld) {
    drop(world);
}
