//! Redis store backend.

use super::{KeyValueStore, StoreError, ttl_secs};
use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, Client};
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// [`KeyValueStore`] over a multiplexed Redis connection.
///
/// TTLs are whole seconds; sub-second TTLs round up to one second.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
    prefix: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        #[cfg(feature = "tracing")]
        info!("Connected to Redis");

        Ok(Self::with_connection(connection, prefix))
    }

    pub fn with_connection(connection: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            connection,
            prefix: prefix.into(),
        }
    }
}

impl KeyValueStore for RedisStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let key = self.namespaced(key);
        let mut conn = self.connection.clone();

        #[cfg(feature = "tracing")]
        debug!(key = %key, ttl = ?ttl, "SET");

        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, StoreError> {
        let key = self.namespaced(key);
        let mut conn = self.connection.clone();

        let reply: Option<String> = ::redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(self.namespaced(key)).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(self.namespaced(key)).await?;
        Ok(exists)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.connection.clone();
        // -2 for a missing key, -1 for a key without expiry
        let secs: i64 = conn.ttl(self.namespaced(key)).await?;
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection.clone();
        let value: i64 = conn.incr(self.namespaced(key), 1).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let secs = i64::try_from(ttl_secs(ttl)).unwrap_or(i64::MAX);
        let updated: bool = conn.expire(self.namespaced(key), secs).await?;
        Ok(updated)
    }
}
