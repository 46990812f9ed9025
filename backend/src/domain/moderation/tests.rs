//! Behaviour of the moderation state machine.

use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockModerationLogRepository, MockPostRepository, MockProfileRepository, ModerationLogError,
};
use crate::domain::{ErrorCode, NewPost, PostType, ProfileState, Role, UserId, form_messages};

struct Mocks {
    posts: MockPostRepository,
    profiles: MockProfileRepository,
    logs: MockModerationLogRepository,
}

impl Mocks {
    fn new() -> Self {
        Self {
            posts: MockPostRepository::new(),
            profiles: MockProfileRepository::new(),
            logs: MockModerationLogRepository::new(),
        }
    }

    fn expect_logs(&mut self, times: usize) {
        self.logs
            .expect_apply()
            .times(times)
            .returning(|_, entry| Ok(stored(entry)));
    }

    fn expect_changes(&mut self, expected: Vec<ModerationChange>) {
        self.logs
            .expect_apply()
            .withf(move |changes, _| *changes == expected)
            .times(1)
            .returning(|_, entry| Ok(stored(entry)));
    }

    fn service(self) -> ModerationService {
        ModerationService::new(
            Arc::new(self.posts),
            Arc::new(self.profiles),
            Arc::new(self.logs),
            Arc::new(DefaultClock),
            ReputationPolicy::default(),
        )
    }
}

fn stored(entry: NewModerationLog) -> ModerationLog {
    ModerationLog {
        id: 1,
        actor_id: entry.actor_id,
        target_user_id: entry.target_user_id,
        post_id: entry.post_id,
        action: entry.action,
        created_at: entry.created_at,
    }
}

fn member(role: Role) -> Profile {
    let mut profile = Profile::new_member(UserId::random(), "member", Utc::now());
    profile.role = role;
    profile
}

fn moderator() -> Viewer {
    Viewer::Member(member(Role::Moderator))
}

fn root_post(spam: SpamStatus) -> Post {
    NewPost::root(
        UserId::random(),
        PostType::Question,
        "A question title",
        "Some content here",
        vec!["rust".to_owned()],
        Utc::now(),
    )
    .with_spam(spam)
    .into_post()
}

#[rstest]
#[tokio::test]
async fn regular_members_cannot_mark_spam() {
    let service = Mocks::new().service();
    let err = service
        .mark_spam(&Viewer::Member(member(Role::Regular)), PostId::random(), false)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = service
        .mark_spam(&Viewer::Anonymous, PostId::random(), false)
        .await
        .expect_err("unauthorized");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn marking_spam_logs_once_and_redirects_to_queue() {
    let post = root_post(SpamStatus::NotSpam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.expect_changes(vec![ModerationChange::SetSpam {
        post_id,
        spam: SpamStatus::Spam,
    }]);

    let decision = mocks
        .service()
        .mark_spam(&moderator(), post_id, false)
        .await
        .expect("marked");
    assert!(decision.changed);
    assert_eq!(decision.next, NextPage::SpamQueue);
}

#[rstest]
#[tokio::test]
async fn restoring_spam_redirects_home() {
    let post = root_post(SpamStatus::Spam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.expect_changes(vec![ModerationChange::SetSpam {
        post_id,
        spam: SpamStatus::NotSpam,
    }]);

    let decision = mocks
        .service()
        .mark_spam(&moderator(), post_id, true)
        .await
        .expect("restored");
    assert_eq!(decision.spam, SpamStatus::NotSpam);
    assert_eq!(decision.next, NextPage::Home);
}

#[rstest]
#[tokio::test]
async fn repeated_spam_mark_is_a_silent_no_op() {
    let post = root_post(SpamStatus::Spam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.expect_logs(0);

    let decision = mocks
        .service()
        .mark_spam(&moderator(), post_id, false)
        .await
        .expect("no-op");
    assert!(!decision.changed);
}

#[rstest]
#[tokio::test]
async fn missing_post_is_not_found() {
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().returning(|_| Ok(None));
    mocks.expect_logs(0);

    let err = mocks
        .service()
        .mark_spam(&moderator(), PostId::random(), false)
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(0, true)]
#[case(4, true)]
#[case(5, false)]
#[tokio::test]
async fn release_bumps_low_reputation_authors(#[case] score: i32, #[case] bumped: bool) {
    let post = root_post(SpamStatus::Quarantined);
    let post_id = post.id;
    let mut author = member(Role::Regular);
    author.user_id = post.author_id;
    author.score = score;
    let author_id = author.user_id;

    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks
        .profiles
        .expect_find_by_user()
        .with(eq(author_id))
        .return_once(move |_| Ok(Some(author)));
    let mut changes = vec![ModerationChange::SetSpam {
        post_id,
        spam: SpamStatus::NotSpam,
    }];
    if bumped {
        changes.push(ModerationChange::AdjustScore {
            user_id: author_id,
            delta: 1,
        });
    }
    mocks.expect_changes(changes);

    let decision = mocks
        .service()
        .release_quarantine(&moderator(), post_id)
        .await
        .expect("released");
    assert!(decision.changed);
    assert_eq!(decision.author_bumped, bumped);
}

#[rstest]
#[tokio::test]
async fn releasing_a_visible_post_changes_nothing() {
    let post = root_post(SpamStatus::NotSpam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.profiles.expect_find_by_user().never();
    mocks.expect_logs(0);

    let decision = mocks
        .service()
        .release_quarantine(&moderator(), post_id)
        .await
        .expect("no-op");
    assert!(!decision.changed);
    assert!(!decision.author_bumped);
}

#[rstest]
#[tokio::test]
async fn deleting_a_root_post_redirects_home() {
    let post = root_post(SpamStatus::NotSpam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.expect_changes(vec![ModerationChange::SetStatus {
        post_id,
        status: PostStatus::Deleted,
    }]);

    let form = PostModerationForm {
        action: "delete".to_owned(),
        comment: String::new(),
    };
    let next = mocks
        .service()
        .moderate_post(&moderator(), post_id, &form)
        .await
        .expect("deleted");
    assert_eq!(next, NextPage::Home);
}

#[rstest]
#[tokio::test]
async fn a_failed_commit_reports_the_error_and_changes_nothing() {
    let post = root_post(SpamStatus::NotSpam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks
        .logs
        .expect_apply()
        .times(1)
        .returning(|_, _| Err(ModerationLogError::missing_target("post vanished")));

    let form = PostModerationForm {
        action: "bump".to_owned(),
        comment: String::new(),
    };
    let err = mocks
        .service()
        .moderate_post(&moderator(), post_id, &form)
        .await
        .expect_err("commit failed");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn bumping_commits_a_single_bump() {
    let post = root_post(SpamStatus::NotSpam);
    let post_id = post.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks
        .logs
        .expect_apply()
        .withf(move |changes, entry| {
            entry.action == "bumped post"
                && matches!(changes.as_slice(), [ModerationChange::Bump { post_id: id, .. }] if *id == post_id)
        })
        .times(1)
        .returning(|_, entry| Ok(stored(entry)));

    let form = PostModerationForm {
        action: "bump".to_owned(),
        comment: String::new(),
    };
    let next = mocks
        .service()
        .moderate_post(&moderator(), post_id, &form)
        .await
        .expect("bumped");
    assert_eq!(next, NextPage::Post(post_id));
}

#[rstest]
#[tokio::test]
async fn deleting_an_answer_redirects_to_thread() {
    let root = root_post(SpamStatus::NotSpam);
    let answer = NewPost::reply(UserId::random(), PostType::Answer, &root, "An answer body", Utc::now())
        .into_post();
    let answer_id = answer.id;
    let root_id = root.id;
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(answer)));
    mocks.expect_changes(vec![ModerationChange::SetStatus {
        post_id: answer_id,
        status: PostStatus::Deleted,
    }]);

    let form = PostModerationForm {
        action: "delete".to_owned(),
        comment: String::new(),
    };
    let next = mocks
        .service()
        .moderate_post(&moderator(), answer_id, &form)
        .await
        .expect("deleted");
    assert_eq!(next, NextPage::Post(root_id));
}

#[rstest]
#[tokio::test]
async fn closing_without_comment_is_rejected_without_logging() {
    let mut mocks = Mocks::new();
    mocks.posts.expect_find().never();
    mocks.expect_logs(0);

    let form = PostModerationForm {
        action: "close".to_owned(),
        comment: "  ".to_owned(),
    };
    let err = mocks
        .service()
        .moderate_post(&moderator(), PostId::random(), &form)
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(!form_messages(&err).is_empty());
}

#[rstest]
#[tokio::test]
async fn moderating_a_user_logs_the_new_state() {
    let target = member(Role::Regular);
    let uid = target.uid.clone();
    let target_id = target.user_id;
    let mut mocks = Mocks::new();
    mocks
        .profiles
        .expect_find_by_uid()
        .return_once(move |_| Ok(Some(target)));
    mocks
        .logs
        .expect_apply()
        .withf(move |changes, entry| {
            entry.action == "set state to Suspended"
                && *changes
                    == vec![ModerationChange::SetState {
                        user_id: target_id,
                        state: ProfileState::Suspended,
                    }]
        })
        .times(1)
        .returning(|_, entry| Ok(stored(entry)));

    let form = UserModerationForm {
        action: "suspended".to_owned(),
    };
    let profile = mocks
        .service()
        .moderate_user(&moderator(), &uid, &form)
        .await
        .expect("moderated");
    assert_eq!(profile.state, ProfileState::Suspended);
}

#[rstest]
#[tokio::test]
async fn moderators_cannot_demote_each_other() {
    let target = member(Role::Moderator);
    let uid = target.uid.clone();
    let mut mocks = Mocks::new();
    mocks
        .profiles
        .expect_find_by_uid()
        .return_once(move |_| Ok(Some(target)));
    mocks.expect_logs(0);

    let form = UserModerationForm {
        action: "banned".to_owned(),
    };
    let err = mocks
        .service()
        .moderate_user(&moderator(), &uid, &form)
        .await
        .expect_err("rejected");
    assert_eq!(
        form_messages(&err),
        vec!["only managers can moderate other moderators".to_owned()]
    );
}

#[rstest]
#[tokio::test]
async fn logs_are_hidden_from_regular_members() {
    let mut mocks = Mocks::new();
    mocks.logs.expect_recent().never();
    let logs = mocks
        .service()
        .recent_logs(&Viewer::Member(member(Role::Regular)))
        .await
        .expect("empty");
    assert!(logs.is_empty());
}

#[rstest]
#[tokio::test]
async fn moderators_see_recent_logs() {
    let mut mocks = Mocks::new();
    mocks
        .logs
        .expect_recent()
        .with(eq(RECENT_LOG_LIMIT))
        .times(1)
        .returning(|_| Ok(Vec::new()));
    mocks
        .service()
        .recent_logs(&moderator())
        .await
        .expect("logs");
}
