//! Memoizing entity resolver
//!
//! Wraps any [`EntityResolver`] with a moka cache keyed by candidate name.
//! Both outcomes are cached, so within one cache lifetime a candidate is
//! looked up at most once and always resolves the same way, even when
//! concurrent requests ask for it at the same time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use relkg_core::{EntityResolver, Resolution};
use serde::{Deserialize, Serialize};

// ============================================================================
// Cached Resolver
// ============================================================================

/// Resolver that memoizes the outcomes of an inner resolver
pub struct CachedResolver<R> {
    inner: R,
    cache: Cache<String, Resolution>,
    stats: Arc<CacheStats>,
}

impl<R: EntityResolver> CachedResolver<R> {
    /// Wrap `inner`, keeping at most `max_capacity` outcomes
    pub fn new(inner: R, max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        let stats = Arc::new(CacheStats::new(inner.name()));
        Self {
            inner,
            cache,
            stats,
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get current cache size
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop all memoized outcomes
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.stats.reset();
    }
}

#[async_trait]
impl<R: EntityResolver> EntityResolver for CachedResolver<R> {
    async fn resolve(&self, candidate: &str) -> Resolution {
        let entry = self
            .cache
            .entry_by_ref(candidate)
            .or_insert_with(self.inner.resolve(candidate))
            .await;

        if entry.is_fresh() {
            self.stats.record_miss();
        } else {
            self.stats.record_hit();
        }
        entry.into_value()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug)]
pub struct CacheStats {
    name: String,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Calculate hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Get a summary report
    pub fn report(&self) -> CacheStatsReport {
        CacheStatsReport {
            name: self.name.clone(),
            hits: self.hits(),
            misses: self.misses(),
            total_requests: self.total_requests(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable cache statistics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relkg_core::Entity;
    use std::sync::atomic::AtomicUsize;

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntityResolver for CountingResolver {
        async fn resolve(&self, candidate: &str) -> Resolution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if candidate.starts_with('?') {
                Resolution::Absent
            } else {
                Resolution::Resolved(Entity::new(candidate.to_uppercase(), "", ""))
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn cached() -> CachedResolver<CountingResolver> {
        CachedResolver::new(
            CountingResolver {
                calls: AtomicUsize::new(0),
            },
            100,
        )
    }

    #[tokio::test]
    async fn test_resolved_outcome_is_memoized() {
        let resolver = cached();

        let first = resolver.resolve("paris").await;
        let second = resolver.resolve("paris").await;

        assert_eq!(first, second);
        assert_eq!(first.entity().map(|e| e.title.as_str()), Some("PARIS"));
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats().hits(), 1);
        assert_eq!(resolver.stats().misses(), 1);
    }

    #[tokio::test]
    async fn test_absent_outcome_is_memoized() {
        let resolver = cached();

        assert_eq!(resolver.resolve("?unknown").await, Resolution::Absent);
        assert_eq!(resolver.resolve("?unknown").await, Resolution::Absent);
        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_resolve_once() {
        let resolver = Arc::new(cached());

        let lookups = (0..8).map(|_| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve("berlin").await })
        });
        for handle in lookups.collect::<Vec<_>>() {
            assert!(handle.await.unwrap().is_resolved());
        }

        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats().total_requests(), 8);
    }

    #[tokio::test]
    async fn test_clear_forgets_outcomes() {
        let resolver = cached();
        resolver.resolve("rome").await;
        resolver.clear().await;
        resolver.resolve("rome").await;

        assert_eq!(resolver.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.stats().misses(), 1);
    }

    #[test]
    fn test_stats_report() {
        let stats = CacheStats::new("wikipedia");
        stats.record_miss();
        stats.record_hit();
        stats.record_hit();

        let report = stats.report();
        assert_eq!(report.name, "wikipedia");
        assert_eq!(report.total_requests, 3);
        assert!((report.hit_rate - 2.0 / 3.0).abs() < 0.001);
    }
}
