//! Authoring, thread visibility and voting rules.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mockable::DefaultClock;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockCountCache, MockPostRepository, MockProfileRepository, MockTaskDispatcher, MockVoteRepository,
};
use crate::domain::{ErrorCode, Role, UserId};

#[derive(Default)]
struct Mocks {
    posts: MockPostRepository,
    profiles: MockProfileRepository,
    votes: MockVoteRepository,
    dispatcher: MockTaskDispatcher,
    views: MockCountCache,
}

impl Mocks {
    fn service(self) -> PostingService {
        PostingService::new(
            PostingPorts {
                posts: Arc::new(self.posts),
                profiles: Arc::new(self.profiles),
                votes: Arc::new(self.votes),
                dispatcher: Arc::new(self.dispatcher),
                views: Arc::new(self.views),
                clock: Arc::new(DefaultClock),
            },
            ReputationPolicy::default(),
            Duration::from_secs(300),
        )
    }
}

fn member(score: i32) -> Profile {
    let mut profile = Profile::new_member(UserId::random(), "member", Utc::now());
    profile.score = score;
    profile
}

fn question(author: UserId) -> Post {
    NewPost::root(author, PostType::Question, "A question title", "Question body", vec![], Utc::now())
        .into_post()
}

fn listing(post: Post) -> PostListing {
    let author = member(0).summary();
    PostListing {
        post,
        author,
        root_title: None,
    }
}

fn form() -> PostForm {
    PostForm {
        title: "How do I pin a future?".to_owned(),
        content: "Some detailed question body".to_owned(),
        post_type: "question".to_owned(),
        tags: "rust async".to_owned(),
    }
}

#[rstest]
#[case(0, SpamStatus::Quarantined)]
#[case(4, SpamStatus::Quarantined)]
#[case(5, SpamStatus::NotSpam)]
#[tokio::test]
async fn new_posts_by_low_reputation_authors_are_quarantined(
    #[case] score: i32,
    #[case] expected: SpamStatus,
) {
    let mut mocks = Mocks::default();
    mocks
        .posts
        .expect_insert()
        .withf(move |new_post| new_post.clone().into_post().spam == expected)
        .times(1)
        .returning(|new_post| Ok(new_post.into_post()));
    mocks
        .dispatcher
        .expect_dispatch()
        .withf(|job| matches!(job, Job::PostCreated { .. }))
        .times(1)
        .returning(|_| ());

    let post = mocks
        .service()
        .create_post(&Viewer::Member(member(score)), &form())
        .await
        .expect("created");
    assert_eq!(post.spam, expected);
    assert_eq!(post.root_id, Some(post.id));
}

#[rstest]
#[tokio::test]
async fn moderators_are_never_quarantined() {
    let mut moderator = member(0);
    moderator.role = Role::Moderator;
    let mut mocks = Mocks::default();
    mocks.posts.expect_insert().returning(|new_post| Ok(new_post.into_post()));
    mocks.dispatcher.expect_dispatch().returning(|_| ());

    let post = mocks
        .service()
        .create_post(&Viewer::Member(moderator), &form())
        .await
        .expect("created");
    assert_eq!(post.spam, SpamStatus::NotSpam);
}

#[rstest]
#[tokio::test]
async fn anonymous_authors_are_rejected() {
    let mut mocks = Mocks::default();
    mocks.posts.expect_insert().never();
    let err = mocks
        .service()
        .create_post(&Viewer::Anonymous, &form())
        .await
        .expect_err("login required");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn replies_to_closed_threads_are_rejected() {
    let mut root = question(UserId::random());
    root.status = PostStatus::Closed;
    let root_id = root.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_insert().never();

    let err = mocks
        .service()
        .create_answer(
            &Viewer::Member(member(10)),
            root_id,
            &AnswerForm {
                content: "Here is how you do it".to_owned(),
            },
        )
        .await
        .expect_err("closed");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn answers_join_the_thread_and_dispatch() {
    let root = question(UserId::random());
    let root_id = root.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_insert().returning(|new_post| Ok(new_post.into_post()));
    mocks
        .dispatcher
        .expect_dispatch()
        .withf(|job| matches!(job, Job::AnswerCreated { .. }))
        .times(1)
        .returning(|_| ());

    let answer = mocks
        .service()
        .create_answer(
            &Viewer::Member(member(10)),
            root_id,
            &AnswerForm {
                content: "Here is how you do it".to_owned(),
            },
        )
        .await
        .expect("answered");
    assert_eq!(answer.post_type, PostType::Answer);
    assert_eq!(answer.root_id, Some(root_id));
    assert_eq!(answer.parent_id, Some(root_id));
}

#[rstest]
#[tokio::test]
async fn replies_redirect_to_their_thread() {
    let root = question(UserId::random());
    let root_id = root.id;
    let reply = NewPost::reply(UserId::random(), PostType::Answer, &root, "reply body", Utc::now())
        .into_post();
    let reply_id = reply.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(reply)));

    let lookup = mocks
        .service()
        .view_thread(&Viewer::Anonymous, reply_id, "127.0.0.1")
        .await
        .expect("lookup");
    assert_eq!(lookup, ThreadLookup::Moved(root_id));
}

#[rstest]
#[tokio::test]
async fn spam_threads_are_hidden_from_anonymous_viewers() {
    let mut root = question(UserId::random());
    root.spam = SpamStatus::Spam;
    let root_id = root.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_thread().never();

    let lookup = mocks
        .service()
        .view_thread(&Viewer::Anonymous, root_id, "127.0.0.1")
        .await
        .expect("lookup");
    assert_eq!(lookup, ThreadLookup::Hidden);
}

#[rstest]
#[tokio::test]
async fn views_are_counted_once_per_viewer_and_spam_replies_filtered() {
    let root = question(UserId::random());
    let root_id = root.id;
    let visible = NewPost::reply(UserId::random(), PostType::Answer, &root, "good", Utc::now()).into_post();
    let spam = NewPost::reply(UserId::random(), PostType::Answer, &root, "buy now", Utc::now())
        .with_spam(SpamStatus::Spam)
        .into_post();
    let thread = vec![listing(root.clone()), listing(visible.clone()), listing(spam)];

    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_thread().with(eq(root_id)).return_once(move |_| Ok(thread));
    mocks.views.expect_get().times(1).returning(|_| Ok(None));
    mocks
        .views
        .expect_set()
        .withf(|key, value, ttl| {
            key.as_str().starts_with("view-") && *value == 1 && *ttl == Duration::from_secs(300)
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    mocks
        .posts
        .expect_increment_views()
        .with(eq(root_id))
        .times(1)
        .returning(|_| Ok(1));
    mocks.dispatcher.expect_dispatch().never();

    let ThreadLookup::Found(thread) = mocks
        .service()
        .view_thread(&Viewer::Member(member(1)), root_id, "10.0.0.1")
        .await
        .expect("lookup")
    else {
        panic!("expected a thread");
    };
    assert_eq!(thread.root.post.id, root_id);
    assert_eq!(thread.replies.len(), 1);
    assert_eq!(thread.replies[0].post.id, visible.id);
}

#[rstest]
#[tokio::test]
async fn repeated_views_are_not_counted() {
    let root = question(UserId::random());
    let root_id = root.id;
    let thread = vec![listing(root.clone())];
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_thread().return_once(move |_| Ok(thread));
    mocks.views.expect_get().returning(|_| Ok(Some(1)));
    mocks.views.expect_set().never();
    mocks.posts.expect_increment_views().never();

    mocks
        .service()
        .view_thread(&Viewer::Anonymous, root_id, "10.0.0.1")
        .await
        .expect("lookup");
}

#[rstest]
#[tokio::test]
async fn members_cannot_upvote_their_own_posts() {
    let voter = member(10);
    let post = question(voter.user_id);
    let post_id = post.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.votes.expect_toggle().never();

    let err = mocks
        .service()
        .toggle_vote(&Viewer::Member(voter), post_id, VoteType::Upvote)
        .await
        .expect_err("own post");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(PostType::Question, Some("Student"))]
#[case(PostType::Answer, Some("Teacher"))]
#[case(PostType::Comment, Some("Commentator"))]
#[case(PostType::Forum, None)]
fn third_upvote_badge_follows_the_post_type(
    #[case] post_type: PostType,
    #[case] expected: Option<&str>,
) {
    let mut post = question(UserId::random());
    post.post_type = post_type;
    assert_eq!(earned_badge(&post, VoteType::Upvote, POPULAR_VOTES), expected);
    assert_eq!(earned_badge(&post, VoteType::Upvote, POPULAR_VOTES + 1), None);
}

#[rstest]
#[case(POPULAR_VIEWS, 0)]
#[case(POPULAR_VIEWS + 1, 1)]
#[case(POPULAR_VIEWS + 2, 0)]
#[tokio::test]
async fn popular_question_follows_the_view_counter(#[case] stored_views: i32, #[case] awards: usize) {
    let root = question(UserId::random());
    let root_id = root.id;
    let author = root.author_id;
    let thread = vec![listing(root.clone())];
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(root)));
    mocks.posts.expect_thread().return_once(move |_| Ok(thread));
    mocks.views.expect_get().returning(|_| Ok(None));
    mocks.views.expect_set().returning(|_, _, _| Ok(()));
    mocks
        .posts
        .expect_increment_views()
        .returning(move |_| Ok(stored_views));
    mocks
        .dispatcher
        .expect_dispatch()
        .withf(move |job| {
            matches!(job, Job::AwardBadge { badge, user_id, .. } if badge == "Popular Question" && *user_id == author)
        })
        .times(awards)
        .returning(|_| ());

    mocks
        .service()
        .view_thread(&Viewer::Anonymous, root_id, "10.0.0.1")
        .await
        .expect("lookup");
}

#[rstest]
#[tokio::test]
async fn third_upvote_awards_student() {
    // The snapshot is stale; the stored counter decides the threshold.
    let mut post = question(UserId::random());
    post.vote_count = 1;
    let post_id = post.id;
    let author = post.author_id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.votes.expect_toggle().returning(|_, _, _, _| Ok(VoteToggle::Added));
    mocks
        .posts
        .expect_adjust_votes()
        .with(eq(post_id), eq(1))
        .times(1)
        .returning(|_, _| Ok(3));
    mocks
        .profiles
        .expect_adjust_score()
        .with(eq(author), eq(1))
        .times(1)
        .returning(|_, _| Ok(()));
    mocks
        .dispatcher
        .expect_dispatch()
        .withf(move |job| {
            matches!(job, Job::AwardBadge { badge, user_id, .. } if badge == "Student" && *user_id == author)
        })
        .times(1)
        .returning(|_| ());

    let outcome = mocks
        .service()
        .toggle_vote(&Viewer::Member(member(1)), post_id, VoteType::Upvote)
        .await
        .expect("voted");
    assert_eq!(outcome.vote_count, 3);
}

#[rstest]
#[tokio::test]
async fn withdrawing_a_bookmark_changes_no_scores() {
    let post = question(UserId::random());
    let post_id = post.id;
    let mut mocks = Mocks::default();
    mocks.posts.expect_find().return_once(move |_| Ok(Some(post)));
    mocks.votes.expect_toggle().returning(|_, _, _, _| Ok(VoteToggle::Removed));
    mocks.posts.expect_adjust_votes().never();
    mocks.profiles.expect_adjust_score().never();
    mocks.dispatcher.expect_dispatch().never();

    let outcome = mocks
        .service()
        .toggle_vote(&Viewer::Member(member(1)), post_id, VoteType::Bookmark)
        .await
        .expect("toggled");
    assert_eq!(outcome.toggle, VoteToggle::Removed);
}

#[rstest]
#[tokio::test]
async fn only_the_thread_author_accepts() {
    let root = question(UserId::random());
    let answer = NewPost::reply(UserId::random(), PostType::Answer, &root, "an answer", Utc::now())
        .into_post();
    let answer_id = answer.id;
    let mut mocks = Mocks::default();
    mocks
        .posts
        .expect_find()
        .returning(move |id| Ok(Some(if id == answer.id { answer.clone() } else { root.clone() })));
    mocks.votes.expect_toggle().never();

    let err = mocks
        .service()
        .toggle_vote(&Viewer::Member(member(1)), answer_id, VoteType::Accept)
        .await
        .expect_err("not the author");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
