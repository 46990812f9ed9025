//! Server configuration loaded via OrthoConfig.
//!
//! Every value can come from the command line, a configuration file or a
//! `FORUM_*` environment variable. Unset values fall back to the defaults
//! below; missing URLs select the in-process adapters.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use pagination::PageSize;
use serde::Deserialize;

use crate::domain::{AdminAccount, DEFAULT_COUNT_TTL, EmailAddress, ReputationPolicy};
use crate::inbound::http::state::{DEFAULT_POSTS_PER_PAGE, HttpTuning};
use crate::outbound::persistence::PoolConfig;
use crate::outbound::queue::{TaskMode, UnknownTaskMode};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SEARCH_CHAR_MIN: usize = 2;
const DEFAULT_VIEW_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SPOOL_POLL_SECS: u64 = 5;
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.org";
/// Only debug builds fall back to this password.
const DEBUG_ADMIN_PASSWORD: &str = "admin-password";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address `{value}`: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    TaskMode(#[from] UnknownTaskMode),
    #[error("posts_per_page must be at least 1")]
    PostsPerPage,
    #[error("database_pool_size must be at least 1")]
    PoolSize,
    #[error("spool_poll_secs must be at least 1")]
    SpoolPoll,
    #[error("invalid admin_email `{0}`")]
    AdminEmail(String),
    #[error("admin_password must be set to seed demo content in release builds")]
    AdminPassword,
}

/// Forum server settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FORUM")]
pub struct ForumSettings {
    /// PostgreSQL connection string; unset keeps everything in memory.
    pub database_url: Option<String>,
    /// Most PostgreSQL connections held open at once.
    pub database_pool_size: Option<u32>,
    /// Redis connection string for the count cache.
    pub redis_url: Option<String>,
    /// Full-text search endpoint.
    pub search_url: Option<String>,
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    pub posts_per_page: Option<u32>,
    /// Lifetime of cached listing counts, in seconds.
    pub count_cache_ttl_secs: Option<u64>,
    /// Authors below this score have their posts quarantined.
    pub low_rep_threshold: Option<i32>,
    /// Score granted when a quarantined post is released.
    pub reputation_bump: Option<i32>,
    pub search_char_min: Option<usize>,
    /// `inline`, `spawn` or `spool`.
    pub task_mode: Option<String>,
    /// Window in which repeated views of a thread count once.
    pub post_view_timeout_secs: Option<u64>,
    /// Seconds between spool worker passes in `spool` mode.
    pub spool_poll_secs: Option<u64>,
    /// Create the administrator and welcome posts at startup. Defaults to on
    /// in debug builds.
    pub seed_demo_content: Option<bool>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
}

impl ForumSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn task_mode(&self) -> Result<TaskMode, SettingsError> {
        Ok(self
            .task_mode
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default())
    }

    /// Pool settings for `database_url`.
    pub fn pool_config(&self, database_url: &str) -> Result<PoolConfig, SettingsError> {
        let config = PoolConfig::new(database_url);
        match self.database_pool_size {
            Some(0) => Err(SettingsError::PoolSize),
            Some(size) => Ok(config.with_max_size(size)),
            None => Ok(config),
        }
    }

    /// Delay between spool worker passes.
    pub fn spool_poll(&self) -> Result<Duration, SettingsError> {
        match self.spool_poll_secs {
            Some(0) => Err(SettingsError::SpoolPoll),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(Duration::from_secs(DEFAULT_SPOOL_POLL_SECS)),
        }
    }

    /// Administrator to seed, or `None` when demo content is disabled.
    pub fn admin_account(&self) -> Result<Option<AdminAccount>, SettingsError> {
        self.admin_account_for(cfg!(debug_assertions))
    }

    fn admin_account_for(&self, debug_build: bool) -> Result<Option<AdminAccount>, SettingsError> {
        if !self.seed_demo_content.unwrap_or(debug_build) {
            return Ok(None);
        }
        let raw_email = self.admin_email.as_deref().unwrap_or(DEFAULT_ADMIN_EMAIL);
        let email =
            EmailAddress::new(raw_email).map_err(|_| SettingsError::AdminEmail(raw_email.to_owned()))?;
        let password = match (&self.admin_password, debug_build) {
            (Some(password), _) => password.clone(),
            (None, true) => DEBUG_ADMIN_PASSWORD.to_owned(),
            (None, false) => return Err(SettingsError::AdminPassword),
        };
        Ok(Some(AdminAccount { email, password }))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS)
    }

    /// Service tunables with defaults filled in.
    pub fn tuning(&self) -> Result<HttpTuning, SettingsError> {
        let posts_per_page = match self.posts_per_page {
            Some(size) => PageSize::new(size).map_err(|_| SettingsError::PostsPerPage)?,
            None => DEFAULT_POSTS_PER_PAGE,
        };
        let defaults = ReputationPolicy::default();
        Ok(HttpTuning {
            posts_per_page,
            count_ttl: self
                .count_cache_ttl_secs
                .map_or(DEFAULT_COUNT_TTL, Duration::from_secs),
            policy: ReputationPolicy {
                low_rep_threshold: self.low_rep_threshold.unwrap_or(defaults.low_rep_threshold),
                bump: self.reputation_bump.unwrap_or(defaults.bump),
            },
            search_char_min: self.search_char_min.unwrap_or(DEFAULT_SEARCH_CHAR_MIN),
            view_timeout: Duration::from_secs(
                self.post_view_timeout_secs
                    .unwrap_or(DEFAULT_VIEW_TIMEOUT_SECS),
            ),
        })
    }
}
