//! Apply database migrations and seed the badge catalogue.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use forum::domain::{AWARD_DEFINITIONS, seed_badges};
use forum::outbound::persistence::{DbPool, DieselBadgeRepository, PoolConfig, run_migrations};

const DATABASE_URL_ENV: &str = "FORUM_DATABASE_URL";

/// `forum-seed` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "forum-seed",
    about = "Run pending migrations and insert or refresh the award badges",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `FORUM_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Seed badges without applying migrations first.
    #[arg(long = "skip-migrations")]
    skip_migrations: bool,
}

impl CliArgs {
    fn database_url(&self) -> Result<String> {
        self.database_url
            .clone()
            .or_else(|| env::var(DATABASE_URL_ENV).ok())
            .ok_or_else(|| eyre!("pass --database-url or set {DATABASE_URL_ENV}"))
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("creating Tokio runtime")?;
    runtime.block_on(seed(args))
}

async fn seed(args: CliArgs) -> Result<()> {
    let database_url = args.database_url()?;
    if !args.skip_migrations {
        run_migrations(&database_url)
            .await
            .wrap_err("running migrations")?;
    }
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("connecting to PostgreSQL")?;
    let badges = DieselBadgeRepository::new(pool);
    let seeded = seed_badges(&badges, AWARD_DEFINITIONS)
        .await
        .wrap_err("seeding badges")?;
    for badge in &seeded {
        info!(id = badge.id, name = %badge.name, "badge ready");
    }
    println!("seeded {} badges", seeded.len());
    Ok(())
}
