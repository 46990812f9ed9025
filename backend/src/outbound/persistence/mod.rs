//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: pool and Diesel failures map onto each port's error.
//!
//! ```ignore
//! use forum::outbound::persistence::{DbPool, DieselPostRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/forum")).await?;
//! let posts = DieselPostRepository::new(pool);
//! ```

mod diesel_badge_repository;
pub(crate) mod diesel_helpers;
mod diesel_moderation_log_repository;
mod diesel_post_repository;
mod diesel_profile_repository;
mod diesel_tag_repository;
mod diesel_task_spool;
mod diesel_vote_repository;
mod migrations;
mod models;
mod pool;
mod row_conversions;
mod schema;

pub use diesel_badge_repository::DieselBadgeRepository;
pub use diesel_moderation_log_repository::DieselModerationLogRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_tag_repository::DieselTagRepository;
pub use diesel_task_spool::DieselTaskSpool;
pub use diesel_vote_repository::{DieselSubscriptionRepository, DieselVoteRepository};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
