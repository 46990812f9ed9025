//! Process-local count cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{CountCache, CountCacheError, CountCacheKey};

/// Count cache holding entries in memory until their TTL passes.
pub struct InMemoryCountCache {
    entries: Mutex<HashMap<String, (u64, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCountCache {
    /// Create an empty cache reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (u64, DateTime<Utc>)>>, CountCacheError> {
        self.entries
            .lock()
            .map_err(|_| CountCacheError::backend("count cache lock poisoned"))
    }
}

#[async_trait]
impl CountCache for InMemoryCountCache {
    async fn get(&self, key: &CountCacheKey) -> Result<Option<u64>, CountCacheError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match entries.get(key.as_str()) {
            Some((value, expires)) if *expires > now => Ok(Some(*value)),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CountCacheKey, value: u64, ttl: Duration) -> Result<(), CountCacheError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| CountCacheError::backend(format!("ttl out of range: {err}")))?;
        let expires = self.clock.utc() + ttl;
        self.lock()?.insert(key.as_str().to_owned(), (value, expires));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MutableClock;
    use rstest::rstest;

    fn key(raw: &str) -> CountCacheKey {
        CountCacheKey::sanitize(raw).expect("non-empty key")
    }

    #[rstest]
    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let cache = InMemoryCountCache::new(clock.clone());

        cache
            .set(&key("latest-rank-all"), 42, Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(cache.get(&key("latest-rank-all")).await.expect("get"), Some(42));

        clock.advance_seconds(61);
        assert_eq!(cache.get(&key("latest-rank-all")).await.expect("get"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_keys_miss() {
        let cache = InMemoryCountCache::new(Arc::new(MutableClock::new(Utc::now())));
        assert_eq!(cache.get(&key("tags")).await.expect("get"), None);
    }
}
