//! Pagination with cached total counts.
//!
//! Counting a filtered listing is the expensive half of rendering a page. The
//! [`CachedPaginator`] stores counts in a [`CountCache`] under a caller
//! supplied key. An empty key disables caching for listings whose count is
//! unstable (searches, free-text filters). A failing cache never fails the
//! request: the count is computed live instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pagination::{Page, PageRequest, PageSize, PageWindow};
use tracing::{debug, warn};

use super::ports::{CountCache, CountCacheKey};

/// Default lifetime of a cached count.
pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(3000);

/// Paginates listings, memoising their total count.
#[derive(Clone)]
pub struct CachedPaginator {
    cache: Arc<dyn CountCache>,
    ttl: Duration,
    page_size: PageSize,
}

impl CachedPaginator {
    /// Create a paginator storing counts in `cache` for `ttl`.
    pub fn new(cache: Arc<dyn CountCache>, ttl: Duration, page_size: PageSize) -> Self {
        Self {
            cache,
            ttl,
            page_size,
        }
    }

    /// Same cache and lifetime with a different page size.
    pub fn with_page_size(&self, page_size: PageSize) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            page_size,
        }
    }

    /// Items per page.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Total count for `key`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned unchanged; cache errors are logged
    /// and ignored.
    pub async fn count<F, Fut, E>(&self, key: &str, compute: F) -> Result<u64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
    {
        let Some(key) = CountCacheKey::sanitize(key) else {
            return compute().await;
        };

        match self.cache.get(&key).await {
            Ok(Some(count)) => {
                debug!(%key, count, "count cache hit");
                return Ok(count);
            }
            Ok(None) => debug!(%key, "count cache miss"),
            Err(error) => warn!(%key, %error, "count cache read failed; computing live"),
        }

        let count = compute().await?;
        if let Err(error) = self.cache.set(&key, count, self.ttl).await {
            warn!(%key, %error, "count cache write failed");
        }
        Ok(count)
    }

    /// Resolve `request` against the (possibly cached) count and fetch the
    /// items of the clamped page.
    pub async fn paginate<T, E, C, CFut, F, FFut>(
        &self,
        key: &str,
        request: PageRequest,
        count: C,
        fetch: F,
    ) -> Result<Page<T>, E>
    where
        C: FnOnce() -> CFut,
        CFut: Future<Output = Result<u64, E>>,
        F: FnOnce(PageWindow) -> FFut,
        FFut: Future<Output = Result<Vec<T>, E>>,
    {
        let total = self.count(key, count).await?;
        let window = request.window(total, self.page_size);
        let items = if total == 0 {
            Vec::new()
        } else {
            fetch(window).await?
        };
        Ok(Page::new(items, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CountCacheError, MockCountCache};
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn size(n: u32) -> PageSize {
        PageSize::new(n).expect("valid page size")
    }

    fn key(raw: &str) -> CountCacheKey {
        CountCacheKey::sanitize(raw).expect("valid key")
    }

    #[rstest]
    #[tokio::test]
    async fn miss_computes_and_stores_with_ttl() {
        let mut cache = MockCountCache::new();
        cache.expect_get().with(eq(key("latest"))).times(1).returning(|_| Ok(None));
        cache
            .expect_set()
            .with(eq(key("latest")), eq(12_u64), eq(Duration::from_secs(30)))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let paginator = CachedPaginator::new(Arc::new(cache), Duration::from_secs(30), size(5));

        let count = paginator
            .count(" lat est ", || async { Ok::<_, ()>(12) })
            .await
            .expect("count");
        assert_eq!(count, 12);
    }

    #[rstest]
    #[tokio::test]
    async fn hit_skips_computation() {
        let mut cache = MockCountCache::new();
        cache.expect_get().returning(|_| Ok(Some(7)));
        cache.expect_set().never();
        let paginator = CachedPaginator::new(Arc::new(cache), DEFAULT_COUNT_TTL, size(5));
        let calls = AtomicUsize::new(0);

        let count = paginator
            .count("tags", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(99)
            })
            .await
            .expect("count");
        assert_eq!(count, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[tokio::test]
    async fn empty_key_bypasses_cache(#[case] raw: &str) {
        let mut cache = MockCountCache::new();
        cache.expect_get().never();
        cache.expect_set().never();
        let paginator = CachedPaginator::new(Arc::new(cache), DEFAULT_COUNT_TTL, size(5));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            paginator
                .count(raw, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(3)
                })
                .await
                .expect("count");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn cache_failures_degrade_to_live_count() {
        let mut cache = MockCountCache::new();
        cache
            .expect_get()
            .returning(|_| Err(CountCacheError::backend("connection refused")));
        cache
            .expect_set()
            .returning(|_, _, _| Err(CountCacheError::backend("connection refused")));
        let paginator = CachedPaginator::new(Arc::new(cache), DEFAULT_COUNT_TTL, size(5));

        let count = paginator
            .count("latest", || async { Ok::<_, ()>(4) })
            .await
            .expect("count");
        assert_eq!(count, 4);
    }

    #[rstest]
    #[tokio::test]
    async fn paginate_clamps_out_of_range_pages() {
        let mut cache = MockCountCache::new();
        cache.expect_get().never();
        let paginator = CachedPaginator::new(Arc::new(cache), DEFAULT_COUNT_TTL, size(2));
        let items: Vec<u32> = (0..5).collect();

        let page = paginator
            .paginate(
                "",
                PageRequest::number(40),
                || async { Ok::<_, ()>(5) },
                |window| {
                    let slice: Vec<u32> = items
                        .iter()
                        .copied()
                        .skip(usize::try_from(window.offset()).unwrap_or(usize::MAX))
                        .take(2)
                        .collect();
                    async move { Ok(slice) }
                },
            )
            .await
            .expect("page");
        assert_eq!(page.number(), 3);
        assert_eq!(page.items(), &[4]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_listing_skips_fetch() {
        let mut cache = MockCountCache::new();
        cache.expect_get().never();
        let paginator = CachedPaginator::new(Arc::new(cache), DEFAULT_COUNT_TTL, size(2));

        let page = paginator
            .paginate(
                "",
                PageRequest::number(3),
                || async { Ok::<_, ()>(0) },
                |_| async { Err::<Vec<u32>, _>(()) },
            )
            .await
            .expect("empty page");
        assert_eq!(page.number(), 1);
        assert!(page.items().is_empty());
    }
}
