//! Builders selecting the adapters behind every HTTP port.
//!
//! Each backend is optional: without a database URL the forum runs on
//! [`MemoryForum`], without Redis the count cache lives in process and
//! without a search URL queries hit the in-memory index.
//!
//! The badge catalogue is seeded on every start, followed by the demo
//! administrator and welcome posts when enabled.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use url::Url;

use forum::domain::ports::{
    BadgeRepository, CountCache, CredentialHasher, JobHandler, ModerationLogRepository,
    PostRepository, ProfileRepository, SearchIndex, SubscriptionRepository, TagRepository,
    TaskSpool, VoteRepository,
};
use forum::domain::{
    AWARD_DEFINITIONS, DemoContentPorts, ForumJobHandler, seed_badges, seed_demo_content,
};
use forum::inbound::http::state::HttpStatePorts;
use forum::outbound::cache::{InMemoryCountCache, RedisCountCache};
use forum::outbound::memory::MemoryForum;
use forum::outbound::persistence::{
    DbPool, DieselBadgeRepository, DieselModerationLogRepository, DieselPostRepository,
    DieselProfileRepository, DieselSubscriptionRepository, DieselTagRepository,
    DieselTaskSpool, DieselVoteRepository, run_migrations,
};
use forum::outbound::queue::{SpoolWorker, TaskMode, build_dispatcher};
use forum::outbound::search::HttpSearchIndex;
use forum::outbound::security::Argon2CredentialHasher;
use forum::settings::ForumSettings;

/// Storage ports before the dispatcher is chosen.
struct Storage {
    label: &'static str,
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    votes: Arc<dyn VoteRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    tags: Arc<dyn TagRepository>,
    badges: Arc<dyn BadgeRepository>,
    logs: Arc<dyn ModerationLogRepository>,
    spool: Arc<dyn TaskSpool>,
    /// Index used when no search service is configured.
    fallback_search: Arc<dyn SearchIndex>,
}

impl Storage {
    fn memory() -> Self {
        let forum = Arc::new(MemoryForum::new());
        Self {
            label: "memory",
            posts: forum.clone(),
            profiles: forum.clone(),
            votes: forum.clone(),
            subscriptions: forum.clone(),
            tags: forum.clone(),
            badges: forum.clone(),
            logs: forum.clone(),
            spool: forum.clone(),
            fallback_search: forum,
        }
    }

    fn postgres(pool: &DbPool) -> Self {
        Self {
            label: "postgres",
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            votes: Arc::new(DieselVoteRepository::new(pool.clone())),
            subscriptions: Arc::new(DieselSubscriptionRepository::new(pool.clone())),
            tags: Arc::new(DieselTagRepository::new(pool.clone())),
            badges: Arc::new(DieselBadgeRepository::new(pool.clone())),
            logs: Arc::new(DieselModerationLogRepository::new(pool.clone())),
            spool: Arc::new(DieselTaskSpool::new(pool.clone())),
            // Posts live in Postgres, so an empty index just answers no hits.
            fallback_search: Arc::new(MemoryForum::new()),
        }
    }
}

async fn build_storage(settings: &ForumSettings) -> Result<Storage> {
    let Some(url) = settings.database_url.as_deref() else {
        warn!("FORUM_DATABASE_URL not set; data is kept in memory");
        return Ok(Storage::memory());
    };
    if settings.run_migrations {
        run_migrations(url).await.wrap_err("running migrations")?;
    }
    let pool = DbPool::new(settings.pool_config(url)?)
        .await
        .wrap_err("connecting to PostgreSQL")?;
    Ok(Storage::postgres(&pool))
}

async fn build_cache(settings: &ForumSettings, clock: &Arc<dyn Clock>) -> Result<Arc<dyn CountCache>> {
    match settings.redis_url.as_deref() {
        Some(url) => Ok(Arc::new(
            RedisCountCache::connect(url)
                .await
                .wrap_err("connecting to Redis")?,
        )),
        None => {
            info!("FORUM_REDIS_URL not set; listing counts are cached in process");
            Ok(Arc::new(InMemoryCountCache::new(clock.clone())))
        }
    }
}

fn build_search(settings: &ForumSettings, fallback: Arc<dyn SearchIndex>) -> Result<Arc<dyn SearchIndex>> {
    match settings.search_url.as_deref() {
        Some(raw) => {
            let endpoint = Url::parse(raw).wrap_err_with(|| format!("invalid search URL `{raw}`"))?;
            Ok(Arc::new(
                HttpSearchIndex::new(endpoint, settings.search_timeout())
                    .wrap_err("building search client")?,
            ))
        }
        None => Ok(fallback),
    }
}

async fn seed_storage(
    settings: &ForumSettings,
    storage: &Storage,
    hasher: &dyn CredentialHasher,
    clock: &dyn Clock,
) -> Result<()> {
    seed_badges(storage.badges.as_ref(), AWARD_DEFINITIONS)
        .await
        .wrap_err("seeding badges")?;
    let Some(admin) = settings.admin_account()? else {
        return Ok(());
    };
    let ports = DemoContentPorts {
        profiles: storage.profiles.as_ref(),
        posts: storage.posts.as_ref(),
        hasher,
        clock,
    };
    if seed_demo_content(ports, &admin)
        .await
        .wrap_err("seeding demo content")?
        .is_some()
    {
        info!(email = admin.email.as_str(), "demo content seeded");
    }
    Ok(())
}

/// Everything the server needs from the selected adapters.
pub(crate) struct ServerPorts {
    pub(crate) http: HttpStatePorts,
    /// Storage label reported by health checks.
    pub(crate) storage: &'static str,
    /// Present in `spool` mode.
    pub(crate) spool_worker: Option<SpoolWorker>,
}

/// Select adapters, seed storage and build the dispatcher.
pub(crate) async fn build_http_ports(settings: &ForumSettings) -> Result<ServerPorts> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2CredentialHasher);
    let storage = build_storage(settings).await?;
    seed_storage(settings, &storage, hasher.as_ref(), clock.as_ref()).await?;
    let cache = build_cache(settings, &clock).await?;
    let search = build_search(settings, storage.fallback_search.clone())?;

    let handler: Arc<dyn JobHandler> = Arc::new(ForumJobHandler::new(
        storage.posts.clone(),
        storage.subscriptions.clone(),
        storage.badges.clone(),
        clock.clone(),
    ));
    let mode = settings.task_mode()?;
    info!(?mode, storage = storage.label, "task dispatcher selected");
    let spool_worker = (mode == TaskMode::Spool)
        .then(|| SpoolWorker::new(storage.spool.clone(), handler.clone()));
    let dispatcher = build_dispatcher(mode, handler, storage.spool.clone());

    let ports = HttpStatePorts {
        posts: storage.posts,
        profiles: storage.profiles,
        votes: storage.votes,
        tags: storage.tags,
        badges: storage.badges,
        logs: storage.logs,
        search,
        cache,
        hasher,
        dispatcher,
        clock,
    };
    Ok(ServerPorts {
        http: ports,
        storage: storage.label,
        spool_worker,
    })
}
