//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **cache**: count caches (Redis or in-process)
//! - **queue**: task dispatch strategies
//! - **search**: HTTP full-text search client
//! - **security**: Argon2 password hashing
//! - **memory**: in-memory implementations of every storage port
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod memory;
pub mod persistence;
pub mod queue;
pub mod search;
pub mod security;
