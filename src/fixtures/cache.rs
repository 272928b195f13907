use crate::config::config::FixtureCacheCfg;
use crate::core::types::FixtureDetails;
use crate::fixtures::client::FixtureClient;
use alloy::primitives::Bytes;
use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Bounded fixture-id -> details cache in front of another `FixtureClient`.
///
/// Entries expire after `ttl` and are evicted least-recently-used beyond
/// `capacity`. Fixture lists and proofs are never cached: proofs must be
/// fresh when a bet is claimed.
pub struct CachedFixtureClient<C> {
    inner: C,
    cache: Mutex<LruCache<u64, (FixtureDetails, Instant)>>,
    ttl: Duration,
}

impl<C: FixtureClient> CachedFixtureClient<C> {
    pub fn new(inner: C, cfg: &FixtureCacheCfg) -> Self {
        let capacity = NonZeroUsize::new(cfg.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: cfg.ttl,
        }
    }

    pub async fn invalidate(&self, id: u64) {
        self.cache.lock().await.pop(&id);
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn cached(&self, id: u64) -> Option<FixtureDetails> {
        let mut cache = self.cache.lock().await;
        let fresh = cache
            .get(&id)
            .filter(|(_, at)| at.elapsed() < self.ttl)
            .map(|(details, _)| details.clone());
        if fresh.is_none() {
            cache.pop(&id);
        }
        fresh
    }
}

#[async_trait]
impl<C: FixtureClient> FixtureClient for CachedFixtureClient<C> {
    async fn fixture(&self, id: u64) -> Result<FixtureDetails> {
        if let Some(hit) = self.cached(id).await {
            debug!(fixture_id = id, "fixture cache hit");
            return Ok(hit);
        }

        // lock is not held across the lookup; failures are not cached
        let details = self.inner.fixture(id).await?;
        self.cache
            .lock()
            .await
            .put(id, (details.clone(), Instant::now()));
        Ok(details)
    }

    async fn upcoming_fixtures(&self) -> Result<Vec<FixtureDetails>> {
        self.inner.upcoming_fixtures().await
    }

    async fn fixture_proof(&self, id: u64) -> Result<Bytes> {
        self.inner.fixture_proof(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::simulator::SimFixtureClient;
    use std::sync::Arc;

    fn cfg(capacity: usize, ttl: Duration) -> FixtureCacheCfg {
        FixtureCacheCfg {
            enabled: true,
            capacity,
            ttl,
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache() {
        let sim = Arc::new(SimFixtureClient::with_fixtures(vec![
            SimFixtureClient::fixture(1, "A", "B"),
        ]));
        let cached = CachedFixtureClient::new(sim.clone(), &cfg(4, Duration::from_secs(60)));

        cached.fixture(1).await.unwrap();
        cached.fixture(1).await.unwrap();
        assert_eq!(sim.lookups(), 1);

        cached.invalidate(1).await;
        cached.fixture(1).await.unwrap();
        assert_eq!(sim.lookups(), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let sim = Arc::new(SimFixtureClient::with_fixtures(vec![
            SimFixtureClient::fixture(1, "A", "B"),
        ]));
        let cached = CachedFixtureClient::new(sim.clone(), &cfg(4, Duration::ZERO));

        cached.fixture(1).await.unwrap();
        cached.fixture(1).await.unwrap();
        assert_eq!(sim.lookups(), 2);
    }

    #[tokio::test]
    async fn capacity_bounds_entries_and_failures_are_not_cached() {
        let sim = Arc::new(SimFixtureClient::with_fixtures(vec![
            SimFixtureClient::fixture(1, "A", "B"),
            SimFixtureClient::fixture(2, "C", "D"),
            SimFixtureClient::fixture(3, "E", "F"),
        ]));
        let cached = CachedFixtureClient::new(sim.clone(), &cfg(2, Duration::from_secs(60)));

        for id in 1..=3 {
            cached.fixture(id).await.unwrap();
        }
        assert_eq!(cached.len().await, 2);

        assert!(cached.fixture(99).await.is_err());
        assert_eq!(cached.len().await, 2);
    }

    #[tokio::test]
    async fn clear_drops_every_entry() {
        let sim = Arc::new(SimFixtureClient::with_fixtures(vec![
            SimFixtureClient::fixture(1, "A", "B"),
            SimFixtureClient::fixture(2, "C", "D"),
        ]));
        let cached = CachedFixtureClient::new(sim.clone(), &cfg(4, Duration::from_secs(60)));

        cached.fixture(1).await.unwrap();
        cached.fixture(2).await.unwrap();
        assert_eq!(cached.len().await, 2);

        cached.clear().await;
        assert_eq!(cached.len().await, 0);
        cached.fixture(1).await.unwrap();
        assert_eq!(sim.lookups(), 3);
    }
}
