//! Role / endpoint / method permission decisions

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{
    auth::store::{bounded, AccessStore},
    error::AppResult,
};

type DecisionKey = (Uuid, String, String);

#[derive(Clone, Copy)]
struct CachedDecision {
    allowed: bool,
    cached_at: Instant,
    /// Insertion order, used to pick eviction victims
    sequence: u64,
}

/// Short-lived memo of store answers, bounded by `capacity`
struct DecisionCache {
    ttl: Duration,
    capacity: usize,
    entries: DashMap<DecisionKey, CachedDecision>,
    next_sequence: AtomicU64,
}

impl DecisionCache {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: DashMap::with_capacity(capacity),
            next_sequence: AtomicU64::new(0),
        }
    }

    fn get(&self, key: &DecisionKey) -> Option<bool> {
        let entry = *self.entries.get(key)?;
        if entry.cached_at.elapsed() >= self.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(entry.allowed)
    }

    fn put(&self, key: DecisionKey, allowed: bool) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.insert(
            key,
            CachedDecision {
                allowed,
                cached_at: Instant::now(),
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// Drop expired decisions, then the oldest tenth if still full
    fn evict(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.cached_at.elapsed() < ttl);
        if self.entries.len() < self.capacity {
            return;
        }

        let mut by_age: Vec<(DecisionKey, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sequence))
            .collect();
        by_age.sort_by_key(|(_, sequence)| *sequence);

        let overflow = self.entries.len() + 1 - self.capacity;
        let to_remove = (self.capacity / 10).max(overflow);
        for (key, _) in by_age.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn AccessStore>,
    query_timeout: Duration,
    cache: Option<Arc<DecisionCache>>,
}

impl PermissionResolver {
    /// A zero `cache_ttl` or `cache_capacity` disables caching
    pub fn new(
        store: Arc<dyn AccessStore>,
        query_timeout: Duration,
        cache_ttl: Duration,
        cache_capacity: usize,
    ) -> Self {
        let cache = (!cache_ttl.is_zero() && cache_capacity > 0)
            .then(|| Arc::new(DecisionCache::new(cache_ttl, cache_capacity)));

        Self {
            store,
            query_timeout,
            cache,
        }
    }

    /// Number of decisions currently held, 0 when caching is off
    pub fn cached_decisions(&self) -> usize {
        self.cache.as_ref().map(|cache| cache.len()).unwrap_or(0)
    }

    /// True iff `role_id` holds an active grant for `endpoint` and `method`.
    ///
    /// `endpoint` must already be normalized. Store failures are returned as
    /// errors and are never cached.
    pub async fn resolve(&self, role_id: Uuid, endpoint: &str, method: &str) -> AppResult<bool> {
        let key = (role_id, endpoint.to_string(), method.to_string());

        if let Some(cache) = &self.cache {
            if let Some(allowed) = cache.get(&key) {
                return Ok(allowed);
            }
        }

        let allowed = bounded(
            self.query_timeout,
            "permission lookup",
            self.store.is_grant_active(role_id, endpoint, method),
        )
        .await?;

        if let Some(cache) = &self.cache {
            cache.put(key, allowed);
        }

        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MockAccessStore;
    use crate::error::AppError;
    use mockall::predicate::eq;

    fn resolver(store: MockAccessStore, cache_ttl: Duration) -> PermissionResolver {
        PermissionResolver::new(Arc::new(store), Duration::from_secs(1), cache_ttl, 1_000)
    }

    #[tokio::test]
    async fn test_active_grant_allows() {
        let role = Uuid::new_v4();
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .with(eq(role), eq("/books/{id}"), eq("GET"))
            .returning(|_, _, _| Ok(true));
        store.expect_is_grant_active().returning(|_, _, _| Ok(false));

        let resolver = resolver(store, Duration::ZERO);
        assert!(resolver.resolve(role, "/books/{id}", "GET").await.unwrap());
        assert!(!resolver.resolve(role, "/books/{id}", "PUT").await.unwrap());
        assert!(!resolver.resolve(role, "/books/{id}", "get").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_error_is_not_a_denial() {
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .returning(|_, _, _| Err(AppError::Dependency("down".to_string())));

        let result = resolver(store, Duration::ZERO)
            .resolve(Uuid::new_v4(), "/books", "GET")
            .await;
        assert!(matches!(result, Err(AppError::Dependency(_))));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_lookups() {
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .times(1)
            .returning(|_, _, _| Ok(true));

        let resolver = resolver(store, Duration::from_secs(60));
        let role = Uuid::new_v4();
        assert!(resolver.resolve(role, "/books", "GET").await.unwrap());
        assert!(resolver.resolve(role, "/books", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mut seq = mockall::Sequence::new();
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(AppError::Dependency("down".to_string())));
        store
            .expect_is_grant_active()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(true));

        let resolver = resolver(store, Duration::from_secs(60));
        let role = Uuid::new_v4();
        assert!(resolver.resolve(role, "/books", "GET").await.is_err());
        assert!(resolver.resolve(role, "/books", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_never_exceeds_capacity() {
        let mut store = MockAccessStore::new();
        store.expect_is_grant_active().returning(|_, _, _| Ok(false));

        let resolver = PermissionResolver::new(
            Arc::new(store),
            Duration::from_secs(1),
            Duration::from_secs(60),
            100,
        );
        let role = Uuid::new_v4();
        for i in 0..10_000 {
            let endpoint = format!("/books/not-a-uuid-{}", i);
            assert!(!resolver.resolve(role, &endpoint, "GET").await.unwrap());
            assert!(resolver.cached_decisions() <= 100);
        }
        assert!(resolver.cached_decisions() > 0);
    }

    #[tokio::test]
    async fn test_eviction_keeps_recent_decisions() {
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .with(eq(Uuid::nil()), eq("/books/9"), eq("GET"))
            .times(1)
            .returning(|_, _, _| Ok(true));
        store.expect_is_grant_active().returning(|_, _, _| Ok(false));

        let resolver = PermissionResolver::new(
            Arc::new(store),
            Duration::from_secs(1),
            Duration::from_secs(60),
            10,
        );
        for i in 0..10 {
            let endpoint = format!("/books/{}", i);
            resolver.resolve(Uuid::nil(), &endpoint, "GET").await.unwrap();
        }
        // Evicts /books/0, the newest entry stays cached
        resolver.resolve(Uuid::nil(), "/books/10", "GET").await.unwrap();
        assert!(resolver.resolve(Uuid::nil(), "/books/9", "GET").await.unwrap());
        assert_eq!(resolver.cached_decisions(), 10);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_cache() {
        let mut store = MockAccessStore::new();
        store
            .expect_is_grant_active()
            .times(2)
            .returning(|_, _, _| Ok(true));

        let resolver = PermissionResolver::new(
            Arc::new(store),
            Duration::from_secs(1),
            Duration::from_secs(60),
            0,
        );
        let role = Uuid::new_v4();
        assert!(resolver.resolve(role, "/books", "GET").await.unwrap());
        assert!(resolver.resolve(role, "/books", "GET").await.unwrap());
        assert_eq!(resolver.cached_decisions(), 0);
    }
}
