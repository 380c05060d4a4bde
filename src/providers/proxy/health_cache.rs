//! Shared cache of provider health results.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// How long a health result stays valid.
pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(60);

static SHARED: Lazy<Arc<HealthCache>> = Lazy::new(|| Arc::new(HealthCache::new(DEFAULT_HEALTH_TTL)));

/// Health results keyed by `health:{provider}`.
///
/// One instance is meant to be shared by every proxy in the process so that
/// repeated checks within the TTL short-circuit no matter which facade
/// issues them. Expiry follows the tokio clock.
#[derive(Debug)]
pub struct HealthCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (bool, Instant)>>,
}

impl HealthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide cache with the default TTL.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(provider: &str) -> String {
        format!("health:{provider}")
    }

    /// Cached result for `provider`, if still fresh.
    pub async fn get(&self, provider: &str) -> Option<bool> {
        let mut entries = self.entries.lock().await;
        let key = Self::key(provider);
        match entries.get(&key) {
            Some(&(healthy, expires_at)) if Instant::now() < expires_at => Some(healthy),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, provider: &str, healthy: bool) {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .lock()
            .await
            .insert(Self::key(provider), (healthy, expires_at));
    }

    /// Drop every cached result.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = HealthCache::default();
        cache.insert("green", false).await;
        assert_eq!(cache.get("green").await, Some(false));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("green").await, Some(false));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("green").await, None);
    }

    #[tokio::test]
    async fn test_keys_are_per_provider() {
        let cache = HealthCache::default();
        cache.insert("green", true).await;
        assert_eq!(cache.get("aero").await, None);

        cache.clear().await;
        assert_eq!(cache.get("green").await, None);
    }

    #[test]
    fn test_shared_is_single_instance() {
        assert!(Arc::ptr_eq(&HealthCache::shared(), &HealthCache::shared()));
    }
}
