//! Facade configuration types.

use crate::providers::proxy::DEFAULT_HEALTH_TTL;
use crate::store::{DEFAULT_PENDING_TTL, MemoryStore};
use crate::strategy::{DEFAULT_MESSAGE_TEMPLATE, FallbackOrder};
use crate::transport::DEFAULT_TIMEOUT;
use crate::utils::retry::RetryConfig;
use std::time::Duration;

#[cfg(feature = "redis-store")]
use crate::store::{RedisStore, StoreError};

/// Configuration for the [`SmsFacade`](super::SmsFacade).
#[derive(Debug, Clone)]
pub struct SmsFacadeConfig {
    /// Regional providers to build from the registry.
    pub provider_names: Vec<String>,
    /// Registry name of the chat gateway.
    pub chat_provider: String,
    /// Retry policy applied by every provider proxy.
    pub retry: RetryConfig,
    /// How long a health result is reused.
    pub health_cache_ttl: Duration,
    /// Lifetime of a pending chat request.
    pub pending_ttl: Duration,
    /// Per-request timeout for provider HTTP calls.
    pub request_timeout: Duration,
    /// Namespace for every store key.
    pub key_prefix: String,
    /// Regional message; `{code}` is replaced with the code.
    pub message_template: String,
    pub fallback_order: FallbackOrder,
}

impl Default for SmsFacadeConfig {
    fn default() -> Self {
        SmsFacadeConfigBuilder::default().build()
    }
}

impl SmsFacadeConfig {
    /// Create a new builder for SmsFacadeConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use otp_gateway::SmsFacadeConfig;
    /// use std::time::Duration;
    ///
    /// let config = SmsFacadeConfig::builder()
    ///     .provider_names(["green", "twilio"])
    ///     .retries(4)
    ///     .request_timeout(Duration::from_secs(5))
    ///     .build();
    ///
    /// assert_eq!(config.provider_names, vec!["green", "twilio"]);
    /// assert_eq!(config.retry.total_attempts(), 5);
    /// ```
    pub fn builder() -> SmsFacadeConfigBuilder {
        SmsFacadeConfigBuilder::default()
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// In-process store namespaced with `key_prefix`.
    pub fn memory_store(&self) -> MemoryStore {
        MemoryStore::new(self.key_prefix.clone())
    }

    /// Redis store namespaced with `key_prefix`.
    #[cfg(feature = "redis-store")]
    pub async fn redis_store(&self, url: &str) -> Result<RedisStore, StoreError> {
        RedisStore::connect(url, self.key_prefix.clone()).await
    }
}

/// Builder for SmsFacadeConfig.
#[derive(Debug, Clone)]
pub struct SmsFacadeConfigBuilder {
    provider_names: Vec<String>,
    chat_provider: String,
    retry: RetryConfig,
    health_cache_ttl: Duration,
    pending_ttl: Duration,
    request_timeout: Duration,
    key_prefix: String,
    message_template: String,
    fallback_order: FallbackOrder,
}

impl Default for SmsFacadeConfigBuilder {
    fn default() -> Self {
        Self {
            provider_names: vec!["green".to_string(), "aero".to_string(), "twilio".to_string()],
            chat_provider: "telegram".to_string(),
            retry: RetryConfig::default(),
            health_cache_ttl: DEFAULT_HEALTH_TTL,
            pending_ttl: DEFAULT_PENDING_TTL,
            request_timeout: DEFAULT_TIMEOUT,
            key_prefix: "sms".to_string(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            fallback_order: FallbackOrder::default(),
        }
    }
}

impl SmsFacadeConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default: `green`, `aero`, `twilio`
    pub fn provider_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provider_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Default: `telegram`
    pub fn chat_provider(mut self, name: impl Into<String>) -> Self {
        self.chat_provider = name.into();
        self
    }

    /// Retries after the first attempt. Default: 2
    pub fn retries(mut self, retries: usize) -> Self {
        self.retry = self.retry.with_retries(retries);
        self
    }

    /// Default: 60 seconds
    pub fn health_cache_ttl(mut self, ttl: Duration) -> Self {
        self.health_cache_ttl = ttl;
        self
    }

    /// Default: 3600 seconds
    pub fn pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Default: 10 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Default: `sms`
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Default: `Your code is {code}`
    pub fn message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    pub fn fallback_order(mut self, order: FallbackOrder) -> Self {
        self.fallback_order = order;
        self
    }

    /// Build the SmsFacadeConfig.
    pub fn build(self) -> SmsFacadeConfig {
        SmsFacadeConfig {
            provider_names: self.provider_names,
            chat_provider: self.chat_provider,
            retry: self.retry,
            health_cache_ttl: self.health_cache_ttl,
            pending_ttl: self.pending_ttl,
            request_timeout: self.request_timeout,
            key_prefix: self.key_prefix,
            message_template: self.message_template,
            fallback_order: self.fallback_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;

    #[test]
    fn test_config_default() {
        let config = SmsFacadeConfig::default();
        assert_eq!(config.provider_names, vec!["green", "aero", "twilio"]);
        assert_eq!(config.chat_provider, "telegram");
        assert_eq!(config.retry.total_attempts(), 3);
        assert_eq!(config.health_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.pending_ttl, Duration::from_secs(3600));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.key_prefix, "sms");
        assert_eq!(config.message_template, "Your code is {code}");
    }

    #[test]
    fn test_config_builder() {
        let config = SmsFacadeConfig::builder()
            .chat_provider("tg")
            .pending_ttl(Duration::from_secs(600))
            .message_template("Code {code}")
            .key_prefix("otp")
            .build();

        assert_eq!(config.chat_provider, "tg");
        assert_eq!(config.pending_ttl, Duration::from_secs(600));
        assert_eq!(config.message_template, "Code {code}");
        assert_eq!(config.memory_store().prefix(), "otp");
    }

    #[test]
    fn test_config_with_methods() {
        let config = SmsFacadeConfig::default()
            .with_retry(RetryConfig::default().with_retries(0))
            .with_key_prefix("x");
        assert_eq!(config.retry.total_attempts(), 1);
        assert_eq!(config.key_prefix, "x");
    }
}
