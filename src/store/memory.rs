//! In-process store backend.

use super::{KeyValueStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-memory [`KeyValueStore`] with TTLs on the tokio clock.
///
/// Clones share the same map. Suitable for tests and single-process deployments.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    prefix: String,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("sms")
    }
}

/// Live entry for `key`, dropping it if expired.
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

impl KeyValueStore for MemoryStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().await.insert(self.namespaced(key), entry);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        if live(&mut entries, &key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, &key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        let existed = live(&mut entries, &key).is_some();
        entries.remove(&key);
        Ok(existed)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, &key).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        Ok(live(&mut entries, &key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let full_key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        match live(&mut entries, &full_key) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| StoreError::NotAnInteger {
                    key: key.to_string(),
                })?;
                let next = current + 1;
                entry.value = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(
                    full_key,
                    Entry {
                        value: "1".to_string(),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let key = self.namespaced(key);
        let mut entries = self.entries.lock().await;
        match live(&mut entries, &key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_set_get_expires() {
        let store = MemoryStore::new("test");
        store
            .set("a", "1".to_string(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.ttl("a").await.unwrap(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(!store.exists("a").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let store = MemoryStore::new("one");
        let other = MemoryStore {
            prefix: "two".to_string(),
            entries: Arc::clone(&store.entries),
        };

        store.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), None);
        assert!(store.entries.lock().await.contains_key("one:k"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::default();
        store.set("k", "v".to_string(), None).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_if_absent() {
        let store = MemoryStore::default();
        let ttl = Duration::from_secs(5);
        assert!(store.set_if_absent("k", "first".to_string(), ttl).await.unwrap());
        assert!(!store.set_if_absent("k", "second".to_string(), ttl).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));

        // An expired entry counts as absent
        tokio::time::advance(ttl).await;
        assert!(store.set_if_absent("k", "third".to_string(), ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment() {
        let store = MemoryStore::default();
        assert_eq!(store.increment("n").await.unwrap(), 1);
        assert_eq!(store.increment("n").await.unwrap(), 2);

        store.set("s", "abc".to_string(), None).await.unwrap();
        assert!(matches!(
            store.increment("s").await.unwrap_err(),
            StoreError::NotAnInteger { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire() {
        let store = MemoryStore::default();
        assert!(!store.expire("missing", Duration::from_secs(1)).await.unwrap());

        store.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), None);
        assert!(store.expire("k", Duration::from_secs(3)).await.unwrap());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::default();
        store
            .set_json("j", &serde_json::json!({"a": 1}), None)
            .await
            .unwrap();
        let value: Option<serde_json::Value> = store.get_json("j").await.unwrap();
        assert_eq!(value, Some(serde_json::json!({"a": 1})));

        store.set("bad", "{".to_string(), None).await.unwrap();
        let err = store.get_json::<serde_json::Value>("bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Serde { .. }));
    }
}
