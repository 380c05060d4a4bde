//! TTL key-value persistence.
//!
//! [`KeyValueStore`] is the collaborator every record store is written
//! against. Backends namespace every key as `{prefix}:{key}` and store values
//! as strings; the typed helpers encode them as JSON.

mod codes;
mod memory;
mod pending;
#[cfg(feature = "redis-store")]
mod redis;

pub use codes::{DEFAULT_CODE_TTL, VerificationCodeStore};
pub use memory::MemoryStore;
pub use pending::{DEFAULT_PENDING_TTL, PendingChatRequest, PendingRequestStore};
#[cfg(feature = "redis-store")]
pub use self::redis::RedisStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis command failed.
    #[cfg(feature = "redis-store")]
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// Failed to encode or decode a stored value.
    #[error("Failed to (de)serialize value for key \"{key}\": {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// `increment` hit a value that is not an integer.
    #[error("Value for key \"{key}\" is not an integer")]
    NotAnInteger { key: String },
}

/// Generic TTL key-value interface with automatic key namespacing.
///
/// All keys passed in are logical; implementations prepend `{prefix}:`.
pub trait KeyValueStore: Send + Sync {
    /// Namespace prepended to every key.
    fn prefix(&self) -> &str;

    /// Store `value`, overwriting any existing entry. `None` means no expiry.
    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Store `value` only if `key` is absent. Returns whether the write happened.
    fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Remove `key`. Idempotent; returns whether something was removed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Remaining lifetime. `None` when the key is absent or never expires.
    fn ttl(&self, key: &str) -> impl Future<Output = Result<Option<Duration>, StoreError>> + Send;

    /// Add one to an integer value, creating it at `1` if absent.
    fn increment(&self, key: &str) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Reset the lifetime of an existing key. Returns `false` if absent.
    fn expire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Full key as stored by the backend.
    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix(), key)
    }

    /// [`KeyValueStore::set`] with a JSON-encoded value.
    fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let encoded = encode(key, value)?;
            self.set(key, encoded, ttl).await
        }
    }

    /// [`KeyValueStore::set_if_absent`] with a JSON-encoded value.
    fn set_json_if_absent<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move {
            let encoded = encode(key, value)?;
            self.set_if_absent(key, encoded, ttl).await
        }
    }

    /// [`KeyValueStore::get`] decoding the value from JSON.
    fn get_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, StoreError>> + Send {
        async move {
            match self.get(key).await? {
                Some(raw) => serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|source| StoreError::Serde {
                        key: key.to_string(),
                        source,
                    }),
                None => Ok(None),
            }
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })
}

/// Whole seconds for backends that only speak seconds; never rounds to zero.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
