//! Post storage, listing predicates and in-memory search.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageWindow;

use crate::domain::listing::{PostFilter, PostOrder, PostQuery, PostScope};
use crate::domain::ports::{PostRepository, PostRepositoryError, SearchHit, SearchIndex, SearchIndexError};
use crate::domain::{
    NewPost, Post, PostId, PostListing, PostStatus, PostType, SpamStatus, SubscriptionType, VoteType,
    rank_at,
};

use super::{ForumState, MemoryForum, Poisoned, count, paged};

impl From<Poisoned> for PostRepositoryError {
    fn from(_: Poisoned) -> Self {
        Self::query("forum state lock poisoned")
    }
}

fn is_visible(post: &Post) -> bool {
    post.is_toplevel && post.status == PostStatus::Open && post.spam == SpamStatus::NotSpam
}

fn matches(state: &ForumState, post: &Post, query: &PostQuery) -> bool {
    if query.scope == PostScope::Visible && !is_visible(post) {
        return false;
    }
    if query.edited_after.is_some_and(|after| post.lastedit_date <= after) {
        return false;
    }
    match &query.filter {
        PostFilter::None => true,
        PostFilter::OfType(post_type) => post.post_type == *post_type,
        PostFilter::SpamQueue => matches!(post.spam, SpamStatus::Spam | SpamStatus::Quarantined),
        PostFilter::Unanswered => post.post_type == PostType::Question && post.answer_count == 0,
        PostFilter::BookmarkedBy(user_id) => state
            .votes
            .contains_key(&(*user_id, post.id, VoteType::Bookmark)),
        PostFilter::FollowedBy(user_id) => state
            .subscriptions
            .get(&(*user_id, post.id))
            .is_some_and(|kind| *kind != SubscriptionType::NoMessages),
        PostFilter::AuthoredBy(user_id) => post.author_id == *user_id,
        PostFilter::VotedBy(user_id) => [VoteType::Upvote, VoteType::Accept]
            .into_iter()
            .any(|vote_type| state.votes.contains_key(&(*user_id, post.id, vote_type))),
        PostFilter::TaggedAny(tags) => post.tags.iter().any(|tag| tags.contains(tag)),
    }
}

fn compare(a: &Post, b: &Post, order: PostOrder) -> Ordering {
    let primary = match order {
        PostOrder::Rank => b.rank.total_cmp(&a.rank),
        PostOrder::Views => b.view_count.cmp(&a.view_count),
        PostOrder::Replies => b.reply_count.cmp(&a.reply_count),
        PostOrder::Votes => b.vote_count.cmp(&a.vote_count),
        PostOrder::Creation => b.creation_date.cmp(&a.creation_date),
        PostOrder::Activity => b.lastedit_date.cmp(&a.lastedit_date),
    };
    primary.then_with(|| b.id.cmp(&a.id))
}

fn listing(state: &ForumState, post: &Post) -> Option<PostListing> {
    let author = state.profiles.get(&post.author_id)?.summary();
    let root_title = post
        .root_id
        .filter(|root| *root != post.id)
        .and_then(|root| state.posts.get(&root))
        .map(|root| root.title.clone());
    Some(PostListing {
        post: post.clone(),
        author,
        root_title,
    })
}

fn update_post<T>(
    state: &mut ForumState,
    id: PostId,
    change: impl FnOnce(&mut Post) -> T,
) -> Result<T, PostRepositoryError> {
    let post = state
        .posts
        .get_mut(&id)
        .ok_or_else(|| PostRepositoryError::query(format!("post {id} not found")))?;
    Ok(change(post))
}

#[async_trait]
impl PostRepository for MemoryForum {
    async fn count(&self, query: &PostQuery) -> Result<u64, PostRepositoryError> {
        let state = self.read()?;
        Ok(count(
            state
                .posts
                .values()
                .filter(|post| matches(&state, post, query))
                .count(),
        ))
    }

    async fn list(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<PostListing>, PostRepositoryError> {
        let state = self.read()?;
        let mut selected: Vec<&Post> = state
            .posts
            .values()
            .filter(|post| matches(&state, post, query))
            .collect();
        selected.sort_by(|a, b| compare(a, b, query.order));
        Ok(paged(selected.into_iter(), window)
            .into_iter()
            .filter_map(|post| listing(&state, post))
            .collect())
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    async fn thread(&self, root_id: PostId) -> Result<Vec<PostListing>, PostRepositoryError> {
        let state = self.read()?;
        let mut members: Vec<&Post> = state
            .posts
            .values()
            .filter(|post| post.thread_root() == root_id)
            .collect();
        members.sort_by(|a, b| {
            a.creation_date
                .cmp(&b.creation_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(members
            .into_iter()
            .filter_map(|post| listing(&state, post))
            .collect())
    }

    async fn listings_by_ids(&self, ids: &[PostId]) -> Result<Vec<PostListing>, PostRepositoryError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.posts.get(id))
            .filter_map(|post| listing(&state, post))
            .collect())
    }

    async fn insert(&self, post: NewPost) -> Result<Post, PostRepositoryError> {
        let post = post.into_post();
        let mut state = self.write()?;
        if !post.is_toplevel {
            let root_id = post.thread_root();
            let created = post.creation_date;
            let is_answer = post.post_type == PostType::Answer;
            update_post(&mut state, root_id, |root| {
                root.reply_count += 1;
                root.answer_count += i32::from(is_answer);
                root.lastedit_date = created;
                root.rank = rank_at(created);
            })?;
        }
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn increment_views(&self, id: PostId) -> Result<i32, PostRepositoryError> {
        update_post(&mut *self.write()?, id, |post| {
            post.view_count += 1;
            post.view_count
        })
    }

    async fn adjust_votes(&self, id: PostId, delta: i32) -> Result<i32, PostRepositoryError> {
        update_post(&mut *self.write()?, id, |post| {
            post.vote_count += delta;
            post.vote_count
        })
    }
}

/// Case-insensitive substring search over titles and bodies. Title matches
/// score higher than body matches.
#[async_trait]
impl SearchIndex for MemoryForum {
    async fn perform_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchIndexError> {
        let needle = query.trim().to_lowercase();
        let state = self
            .read()
            .map_err(|_| SearchIndexError::unavailable("forum state lock poisoned"))?;
        let mut hits: Vec<(SearchHit, DateTime<Utc>)> = state
            .posts
            .values()
            .filter_map(|post| {
                let score = if post.title.to_lowercase().contains(&needle) {
                    2.0
                } else if post.content.to_lowercase().contains(&needle) {
                    1.0
                } else {
                    return None;
                };
                Some((
                    SearchHit {
                        post_id: post.id,
                        score,
                    },
                    post.lastedit_date,
                ))
            })
            .collect();
        hits.sort_by(|(a, a_date), (b, b_date)| {
            b.score.total_cmp(&a.score).then_with(|| b_date.cmp(a_date))
        });
        Ok(hits.into_iter().take(limit).map(|(hit, _)| hit).collect())
    }
}


#[cfg(test)]
mod filter_tests {
    use super::*;
    use crate::domain::ports::{SubscriptionRepository, VoteRepository};
    use crate::domain::{Profile, UserId};
    use pagination::{PageRequest, PageSize};
    use rstest::rstest;

    struct Fixture {
        forum: MemoryForum,
        reader: UserId,
        first: PostId,
        second: PostId,
        third: PostId,
    }

    async fn fixture() -> Fixture {
        let forum = MemoryForum::new();
        let author = UserId::random();
        let reader = UserId::random();
        forum
            .write()
            .map(|mut state| {
                for (user_id, name) in [(author, "author"), (reader, "reader")] {
                    state
                        .profiles
                        .insert(user_id, Profile::new_member(user_id, name, Utc::now()));
                }
            })
            .unwrap_or_else(|_| panic!("lock"));
        let mut ids = Vec::new();
        for title in ["First question", "Second question", "Third question"] {
            let post = NewPost::root(author, PostType::Question, title, "Body text here", vec![], Utc::now());
            ids.push(forum.insert(post).await.expect("insert").id);
        }
        Fixture {
            forum,
            reader,
            first: ids[0],
            second: ids[1],
            third: ids[2],
        }
    }

    async fn listed(forum: &MemoryForum, scope: PostScope, filter: PostFilter) -> Vec<PostId> {
        let query = PostQuery {
            scope,
            filter,
            ..PostQuery::visible()
        };
        let total = forum.count(&query).await.expect("count");
        let window = PageRequest::first().window(total, PageSize::new(10).expect("size"));
        let mut ids: Vec<PostId> = forum
            .list(&query, window)
            .await
            .expect("list")
            .into_iter()
            .map(|listing| listing.post.id)
            .collect();
        assert_eq!(u64::try_from(ids.len()).expect("small"), total);
        ids.sort();
        ids
    }

    fn sorted(mut ids: Vec<PostId>) -> Vec<PostId> {
        ids.sort();
        ids
    }

    #[rstest]
    #[tokio::test]
    async fn following_skips_muted_subscriptions() {
        let f = fixture().await;
        for (post_id, kind) in [
            (f.first, SubscriptionType::Local),
            (f.second, SubscriptionType::Email),
            (f.third, SubscriptionType::NoMessages),
        ] {
            SubscriptionRepository::subscribe(&f.forum, f.reader, post_id, kind)
                .await
                .expect("subscribe");
        }

        let ids = listed(&f.forum, PostScope::Visible, PostFilter::FollowedBy(f.reader)).await;
        assert_eq!(ids, sorted(vec![f.first, f.second]));
    }

    #[rstest]
    #[tokio::test]
    async fn bookmarks_include_posts_that_are_no_longer_open() {
        let f = fixture().await;
        for post_id in [f.first, f.second] {
            VoteRepository::toggle(&f.forum, f.reader, post_id, VoteType::Bookmark, Utc::now())
                .await
                .expect("bookmark");
        }
        VoteRepository::toggle(&f.forum, f.reader, f.third, VoteType::Upvote, Utc::now())
            .await
            .expect("upvote");
        f.forum
            .write()
            .map(|mut state| {
                if let Some(post) = state.posts.get_mut(&f.second) {
                    post.status = PostStatus::Closed;
                }
            })
            .unwrap_or_else(|_| panic!("lock"));

        let ids = listed(&f.forum, PostScope::Everything, PostFilter::BookmarkedBy(f.reader)).await;
        assert_eq!(ids, sorted(vec![f.first, f.second]));
    }

    #[rstest]
    #[tokio::test]
    async fn my_votes_count_upvotes_and_accepts_only() {
        let f = fixture().await;
        for (post_id, vote_type) in [
            (f.first, VoteType::Upvote),
            (f.second, VoteType::Accept),
            (f.third, VoteType::Bookmark),
        ] {
            VoteRepository::toggle(&f.forum, f.reader, post_id, vote_type, Utc::now())
                .await
                .expect("vote");
        }

        let ids = listed(&f.forum, PostScope::Visible, PostFilter::VotedBy(f.reader)).await;
        assert_eq!(ids, sorted(vec![f.first, f.second]));

        let someone_else = UserId::random();
        assert!(listed(&f.forum, PostScope::Visible, PostFilter::VotedBy(someone_else))
            .await
            .is_empty());
    }
}
