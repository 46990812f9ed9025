//! Count cache adapters.
//!
//! - [`InMemoryCountCache`]: process-local map with clock-driven expiry, used
//!   when no Redis URL is configured and in tests.
//! - [`RedisCountCache`]: `bb8-redis` pool with namespaced, fingerprinted
//!   keys and jittered TTLs.

mod memory;
mod redis_cache;

pub use memory::InMemoryCountCache;
pub use redis_cache::{RedisCountCache, count_key};
