//! Port interface for caching expensive listing counts.
use std::time::Duration;

use async_trait::async_trait;

use super::{CountCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by count cache adapters.
    pub enum CountCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "count cache backend failure: {message}",
        /// A stored value could not be decoded.
        Corrupt { message: String } => "count cache value is corrupt: {message}",
    }
}

/// Key/value store holding listing counts with a time-to-live.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountCache: Send + Sync {
    /// Read the count stored under `key`, if it has not expired.
    async fn get(&self, key: &CountCacheKey) -> Result<Option<u64>, CountCacheError>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &CountCacheKey, value: u64, ttl: Duration) -> Result<(), CountCacheError>;
}
