/// Short-lived state storage for authorization flows
///
/// Entries are keyed by the caller's state value and expire after a TTL.
/// Colliding keys overwrite.
use crate::token::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Data kept between issuing a login URL and redeeming the code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceState {
    pub verifier: String,
    pub login_hint: Option<String>,
}

#[derive(Clone)]
pub struct StateCache<V> {
    clock: Arc<dyn Clock>,
    entries: Arc<RwLock<HashMap<String, (V, DateTime<Utc>)>>>,
}

impl<V: Clone> StateCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.into(), (value, expires_at));
    }

    /// Unexpired value for `key`; an expired entry is evicted
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let expired = match entries.get(key) {
            Some((value, expires_at)) if now < *expires_at => return Some(value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Remove and return the unexpired value for `key`
    pub async fn take(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .write()
            .await
            .remove(key)
            .filter(|(_, expires_at)| now < *expires_at)
            .map(|(value, _)| value)
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| now < *expires_at);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ManualClock;

    fn cache() -> (StateCache<PkceState>, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (StateCache::new(Arc::new(clock.clone())), clock)
    }

    fn state(verifier: &str) -> PkceState {
        PkceState {
            verifier: verifier.to_string(),
            login_hint: None,
        }
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let (cache, clock) = cache();
        cache.set("entry-1", state("v1"), Duration::seconds(600)).await;

        clock.advance(Duration::seconds(599));
        assert_eq!(cache.get("entry-1").await, Some(state("v1")));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("entry-1").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_collision_overwrites() {
        let (cache, _) = cache();
        cache.set("entry-1", state("v1"), Duration::seconds(600)).await;
        cache.set("entry-1", state("v2"), Duration::seconds(600)).await;
        assert_eq!(cache.get("entry-1").await, Some(state("v2")));
    }

    #[tokio::test]
    async fn test_take_removes() {
        let (cache, _) = cache();
        cache.set("entry-1", state("v1"), Duration::seconds(600)).await;
        assert_eq!(cache.take("entry-1").await, Some(state("v1")));
        assert_eq!(cache.take("entry-1").await, None);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (cache, clock) = cache();
        cache.set("short", state("a"), Duration::seconds(10)).await;
        cache.set("long", state("b"), Duration::seconds(600)).await;

        clock.advance(Duration::seconds(60));
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.get("long").await, Some(state("b")));
    }
}
