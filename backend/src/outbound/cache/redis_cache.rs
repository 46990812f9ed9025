//! Redis-backed count cache.
//!
//! Keys are namespaced and fingerprinted (`forum:count:v1:<sha256>`) so raw
//! topic strings never reach Redis and a schema change can bump the version.
//! TTLs carry up to ten percent of random jitter so entries written together
//! do not expire together.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::ports::{CountCache, CountCacheError, CountCacheKey};

const KEY_NAMESPACE: &str = "forum:count:v1";

/// Redis key for a count cache key.
pub fn count_key(key: &CountCacheKey) -> String {
    let digest = Sha256::digest(key.as_str().as_bytes());
    format!("{KEY_NAMESPACE}:{}", hex::encode(digest))
}

fn jittered(ttl: Duration, rng: &mut impl Rng) -> Duration {
    let spread = ttl.as_secs() / 10;
    if spread == 0 {
        return ttl;
    }
    ttl + Duration::from_secs(rng.gen_range(0..=spread))
}

/// Count cache stored in Redis.
#[derive(Clone)]
pub struct RedisCountCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCountCache {
    /// Connect a pool to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CountCacheError::Backend`] when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(redis_url: &str) -> Result<Self, CountCacheError> {
        let manager = RedisConnectionManager::new(redis_url)
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(8)
            .connection_timeout(Duration::from_secs(2))
            .build(manager)
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl CountCache for RedisCountCache {
    async fn get(&self, key: &CountCacheKey) -> Result<Option<u64>, CountCacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        let raw: Option<String> = conn
            .get(count_key(key))
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        raw.map(|value| {
            value.parse::<u64>().map_err(|err| {
                debug!(key = %key, error = %err, "cached count is not a number");
                CountCacheError::corrupt(format!("{key}: {err}"))
            })
        })
        .transpose()
    }

    async fn set(&self, key: &CountCacheKey, value: u64, ttl: Duration) -> Result<(), CountCacheError> {
        let ttl = jittered(ttl, &mut SmallRng::from_entropy());
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        let () = conn
            .set_ex(count_key(key), value.to_string(), ttl.as_secs().max(1))
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        Ok(())
    }
}
