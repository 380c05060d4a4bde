//! Retry and health-cache wrapper for providers.

mod health_cache;

pub use health_cache::{DEFAULT_HEALTH_TTL, HealthCache};

use super::traits::{ChatGateway, SendAbility, SendMeta, SmsProvider};
use crate::errors::ProviderDeliveryError;
use crate::types::{DeliveryId, PhoneNumber, RequestId};
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use crate::utils::phone::mask_phone;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Callback invoked before each retry with the error that caused it.
pub type OnRetryCallback = Arc<dyn Fn(&ProviderDeliveryError, Duration) + Send + Sync>;

/// Transparent wrapper adding bounded retry to `send_sms` and a shared
/// TTL cache to `health_check`.
///
/// Every failure is retried the same way; there is no classification of
/// transient versus permanent errors. The last error is returned when all
/// attempts fail.
///
/// # Example
///
/// ```rust,ignore
/// use otp_gateway::{HealthCache, RetryConfig, SmsProviderProxy};
///
/// let proxy = SmsProviderProxy::new(provider)
///     .with_retry_config(RetryConfig::default().with_retries(4))
///     .with_health_cache(HealthCache::shared());
/// ```
pub struct SmsProviderProxy<P: SmsProvider> {
    inner: Arc<P>,
    retry_config: RetryConfig,
    health_cache: Arc<HealthCache>,
    on_retry: Option<OnRetryCallback>,
}

impl<P: SmsProvider> Clone for SmsProviderProxy<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_config: self.retry_config.clone(),
            health_cache: Arc::clone(&self.health_cache),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<P: SmsProvider + Debug> Debug for SmsProviderProxy<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsProviderProxy")
            .field("inner", &self.inner)
            .field("retry_config", &self.retry_config)
            .field("health_cache", &self.health_cache)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<P: SmsProvider> SmsProviderProxy<P> {
    /// Wrap a provider with the default retry policy and the process-wide
    /// health cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_config: RetryConfig::default(),
            health_cache: HealthCache::shared(),
            on_retry: None,
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_health_cache(mut self, health_cache: Arc<HealthCache>) -> Self {
        self.health_cache = health_cache;
        self
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProviderDeliveryError, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Get reference to the inner provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

impl<P: SmsProvider> SmsProvider for SmsProviderProxy<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsProviderProxy::send_sms",
            skip_all,
            fields(provider = %self.inner.name(), phone = %mask_phone(phone.as_str()))
        )
    )]
    async fn send_sms(
        &self,
        phone: &PhoneNumber,
        text: &str,
        meta: Option<&SendMeta>,
    ) -> Result<DeliveryId, ProviderDeliveryError> {
        let inner = &self.inner;
        let on_retry = &self.on_retry;

        #[cfg(feature = "tracing")]
        debug!(attempts = self.retry_config.total_attempts(), "Sending SMS");

        let result = (move || async move { inner.send_sms(phone, text, meta).await })
            .retry(self.retry_config.build_strategy())
            .notify(move |err: &ProviderDeliveryError, duration: Duration| {
                if let Some(callback) = on_retry {
                    callback(err, duration);
                }

                #[cfg(feature = "tracing")]
                warn!(error = %err, "Retrying send_sms");
            })
            .await;

        #[cfg(feature = "tracing")]
        match &result {
            Ok(id) => debug!(delivery_id = %id, "SMS sent"),
            Err(err) => warn!(error = %err, "All attempts failed"),
        }

        result
    }

    async fn health_check(&self) -> bool {
        let name = self.inner.name();
        if let Some(healthy) = self.health_cache.get(name).await {
            return healthy;
        }

        let healthy = self.inner.health_check().await;
        self.health_cache.insert(name, healthy).await;

        #[cfg(feature = "tracing")]
        debug!(provider = %name, healthy, "Health check refreshed");

        healthy
    }
}

/// Gateway calls other than `send_sms` pass through without retry.
impl<P: ChatGateway> ChatGateway for SmsProviderProxy<P> {
    async fn check_send_ability(
        &self,
        phone: &PhoneNumber,
    ) -> Result<SendAbility, ProviderDeliveryError> {
        self.inner.check_send_ability(phone).await
    }

    async fn check_verification_status(
        &self,
        request_id: &RequestId,
    ) -> Result<bool, ProviderDeliveryError> {
        self.inner.check_verification_status(request_id).await
    }

    async fn revoke_verification_message(
        &self,
        request_id: &RequestId,
    ) -> Result<bool, ProviderDeliveryError> {
        self.inner.revoke_verification_message(request_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FlakyProvider {
        failures_before_success: usize,
        sends: AtomicUsize,
        health_checks: AtomicUsize,
    }

    impl SmsProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn send_sms(
            &self,
            _phone: &PhoneNumber,
            _text: &str,
            _meta: Option<&SendMeta>,
        ) -> Result<DeliveryId, ProviderDeliveryError> {
            let attempt = self.sends.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                Err(ProviderDeliveryError::rejected("flaky", format!("attempt {attempt}")))
            } else {
                Ok(DeliveryId::from("ok"))
            }
        }

        async fn health_check(&self) -> bool {
            self.health_checks.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn flaky(failures_before_success: usize) -> FlakyProvider {
        FlakyProvider {
            failures_before_success,
            ..Default::default()
        }
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+14155550123").unwrap()
    }

    #[tokio::test]
    async fn test_three_attempts_then_last_error() {
        let proxy = SmsProviderProxy::new(flaky(usize::MAX))
            .with_health_cache(Arc::new(HealthCache::default()));

        let err = proxy.send_sms(&phone(), "hi", None).await.unwrap_err();
        assert_eq!(proxy.inner().sends.load(Ordering::SeqCst), 3);
        assert!(matches!(err, ProviderDeliveryError::Rejected { ref reason, .. } if reason == "attempt 2"));
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let retries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&retries);
        let proxy = SmsProviderProxy::new(flaky(2))
            .with_health_cache(Arc::new(HealthCache::default()))
            .with_on_retry(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let id = proxy.send_sms(&phone(), "hi", None).await.unwrap();
        assert_eq!(id.as_ref(), "ok");
        assert_eq!(proxy.inner().sends.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let proxy = SmsProviderProxy::new(flaky(usize::MAX))
            .with_retry_config(RetryConfig::default().with_retries(0))
            .with_health_cache(Arc::new(HealthCache::default()));

        assert!(proxy.send_sms(&phone(), "hi", None).await.is_err());
        assert_eq!(proxy.inner().sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_is_cached_for_ttl() {
        let proxy = SmsProviderProxy::new(flaky(0))
            .with_health_cache(Arc::new(HealthCache::default()));

        assert!(proxy.health_check().await);
        assert!(proxy.health_check().await);
        assert_eq!(proxy.inner().health_checks.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(proxy.health_check().await);
        assert_eq!(proxy.inner().health_checks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_health_cache_is_shared_between_proxies() {
        let cache = Arc::new(HealthCache::default());
        let first = SmsProviderProxy::new(flaky(0)).with_health_cache(Arc::clone(&cache));
        let second = SmsProviderProxy::new(flaky(0)).with_health_cache(cache);

        assert!(first.health_check().await);
        assert!(second.health_check().await);
        assert_eq!(first.inner().health_checks.load(Ordering::SeqCst), 1);
        assert_eq!(second.inner().health_checks.load(Ordering::SeqCst), 0);
    }
}
