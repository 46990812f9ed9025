//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use pagination::PageSize;

use crate::domain::ports::{
    BadgeRepository, CountCache, CredentialHasher, ModerationLogRepository, PostRepository,
    ProfileRepository, SearchIndex, TagRepository, TaskDispatcher, VoteRepository,
};
use crate::domain::{
    AccountService, ApiResult, BadgeService, CachedPaginator, CommunityService,
    DEFAULT_COUNT_TTL, ModerationService, PostListingService, PostingPorts, PostingService,
    ReputationPolicy, SearchService, TagService, Viewer,
};

use super::session::SessionContext;

/// Default number of posts per listing page.
pub const DEFAULT_POSTS_PER_PAGE: PageSize = match PageSize::new(40) {
    Ok(size) => size,
    Err(_) => panic!("default page size must be non-zero"),
};

/// Parameter object bundling every port the HTTP services need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub posts: Arc<dyn PostRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub badges: Arc<dyn BadgeRepository>,
    pub logs: Arc<dyn ModerationLogRepository>,
    pub search: Arc<dyn SearchIndex>,
    pub cache: Arc<dyn CountCache>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub clock: Arc<dyn Clock>,
}

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTuning {
    /// Posts per listing page.
    pub posts_per_page: PageSize,
    /// Lifetime of cached listing counts.
    pub count_ttl: Duration,
    /// Quarantine threshold and release bump.
    pub policy: ReputationPolicy,
    /// Shortest accepted search query.
    pub search_char_min: usize,
    /// Window in which repeated views of a thread count once.
    pub view_timeout: Duration,
}

impl Default for HttpTuning {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            count_ttl: DEFAULT_COUNT_TTL,
            policy: ReputationPolicy::default(),
            search_char_min: 2,
            view_timeout: Duration::from_secs(300),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub listings: PostListingService,
    pub posting: PostingService,
    pub moderation: ModerationService,
    pub tags: TagService,
    pub community: CommunityService,
    pub badges: BadgeService,
    pub search: SearchService,
}

impl HttpState {
    /// Build every service over `ports`.
    pub fn new(ports: HttpStatePorts, tuning: HttpTuning) -> Self {
        let HttpStatePorts {
            posts,
            profiles,
            votes,
            tags,
            badges,
            logs,
            search,
            cache,
            hasher,
            dispatcher,
            clock,
        } = ports;
        let paginator = CachedPaginator::new(cache.clone(), tuning.count_ttl, tuning.posts_per_page);

        Self {
            accounts: AccountService::new(profiles.clone(), hasher, clock.clone()),
            listings: PostListingService::new(posts.clone(), paginator.clone(), clock.clone()),
            posting: PostingService::new(
                PostingPorts {
                    posts: posts.clone(),
                    profiles: profiles.clone(),
                    votes,
                    dispatcher,
                    views: cache,
                    clock: clock.clone(),
                },
                tuning.policy,
                tuning.view_timeout,
            ),
            moderation: ModerationService::new(
                posts.clone(),
                profiles.clone(),
                logs,
                clock.clone(),
                tuning.policy,
            ),
            tags: TagService::new(tags, paginator.clone()),
            community: CommunityService::new(profiles.clone(), &paginator, clock),
            badges: BadgeService::new(badges, profiles, paginator),
            search: SearchService::new(search, posts, tuning.search_char_min),
        }
    }

    /// Resolve the party behind `session`.
    pub async fn viewer(&self, session: &SessionContext) -> ApiResult<Viewer> {
        self.accounts.resolve_viewer(session.user_id()?).await
    }
}
