//! Delivery orchestrator.

use super::config::SmsFacadeConfig;
use super::error::{AggregateHealthError, SendAuthCodeError, SendSmsError};
use super::traits::AuthCodeService;
use crate::errors::ProviderConfigError;
use crate::factory::{ProviderFactory, ProviderRegistry};
use crate::providers::proxy::DEFAULT_HEALTH_TTL;
use crate::providers::{AnyProvider, ChatGateway, HealthCache, SmsProvider, SmsProviderProxy, TelegramProvider};
use crate::store::{KeyValueStore, PendingRequestStore};
use crate::strategy::{ProviderSelectionStrategy, RegionBasedStrategy, TelegramFallbackStrategy};
use crate::types::{AuthCode, DeliveryId, PhoneNumber, SendAuthCodeResult};
use crate::utils::phone::mask_phone;
use futures_util::future::{join, join_all};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Facade over the chat gateway, the regional carriers and the pending store.
///
/// Every provider is wrapped in an [`SmsProviderProxy`] sharing one retry
/// policy and one health cache. Delivery runs through a
/// [`TelegramFallbackStrategy`]; the single-provider [`SmsFacade::send_sms`]
/// path picks its carrier with [`RegionBasedStrategy`].
///
/// # Example
///
/// ```rust,ignore
/// use otp_gateway::{ProviderRegistry, SmsFacade, SmsFacadeConfig};
///
/// let config = SmsFacadeConfig::default();
/// let store = config.redis_store("redis://localhost:6379").await?;
/// let facade = SmsFacade::from_registry(ProviderRegistry::from_env(), store, config)?;
///
/// let result = facade.send_auth_code("+79991234567", "4821").await?;
/// println!("delivered via telegram: {}", result.telegram_way);
/// ```
pub struct SmsFacade<C, P, S>
where
    C: ChatGateway,
    P: SmsProvider,
    S: KeyValueStore,
{
    strategy: TelegramFallbackStrategy<SmsProviderProxy<C>, SmsProviderProxy<P>, S>,
    selector: RegionBasedStrategy,
    config: SmsFacadeConfig,
}

fn proxied<T: SmsProvider>(provider: T, config: &SmsFacadeConfig, cache: &Arc<HealthCache>) -> SmsProviderProxy<T> {
    SmsProviderProxy::new(provider)
        .with_retry_config(config.retry.clone())
        .with_health_cache(Arc::clone(cache))
}

impl<C, P, S> SmsFacade<C, P, S>
where
    C: ChatGateway,
    P: SmsProvider,
    S: KeyValueStore,
{
    /// Compose a facade from already built providers.
    ///
    /// With the default health TTL the process-wide cache is used, so every
    /// facade in the process shares health results.
    pub fn new(chat: C, providers: Vec<P>, store: S, config: SmsFacadeConfig) -> Self {
        let cache = if config.health_cache_ttl == DEFAULT_HEALTH_TTL {
            HealthCache::shared()
        } else {
            Arc::new(HealthCache::new(config.health_cache_ttl))
        };
        Self::with_health_cache(chat, providers, store, config, cache)
    }

    /// Same as [`SmsFacade::new`] with an explicit health cache.
    pub fn with_health_cache(
        chat: C,
        providers: Vec<P>,
        store: S,
        config: SmsFacadeConfig,
        cache: Arc<HealthCache>,
    ) -> Self {
        let chat = proxied(chat, &config, &cache);
        let providers = providers
            .into_iter()
            .map(|provider| proxied(provider, &config, &cache))
            .collect();
        let pending = PendingRequestStore::new(store).with_ttl(config.pending_ttl);

        let strategy = TelegramFallbackStrategy::new(chat, providers, pending)
            .with_fallback_order(config.fallback_order.clone())
            .with_message_template(config.message_template.clone());

        Self {
            strategy,
            selector: RegionBasedStrategy,
            config,
        }
    }

    /// Get reference to the facade configuration.
    pub fn config(&self) -> &SmsFacadeConfig {
        &self.config
    }

    /// The proxied chat gateway.
    pub fn chat(&self) -> &SmsProviderProxy<C> {
        self.strategy.chat()
    }

    /// The proxied regional carriers.
    pub fn providers(&self) -> &[SmsProviderProxy<P>] {
        self.strategy.providers()
    }

    pub fn pending(&self) -> &PendingRequestStore<S> {
        self.strategy.pending()
    }

    /// Deliver `code` to `phone`, chat first, regional carriers after.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsFacade::send_auth_code", skip_all, fields(phone = %mask_phone(phone)))
    )]
    pub async fn send_auth_code(&self, phone: &str, code: &str) -> Result<SendAuthCodeResult, SendAuthCodeError> {
        self.deliver(phone, code, None).await
    }

    /// Same as [`SmsFacade::send_auth_code`] with a custom chat payload.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsFacade::send_auth_code_with_payload",
            skip_all,
            fields(phone = %mask_phone(phone))
        )
    )]
    pub async fn send_auth_code_with_payload(
        &self,
        phone: &str,
        code: &str,
        payload: &str,
    ) -> Result<SendAuthCodeResult, SendAuthCodeError> {
        self.deliver(phone, code, Some(payload)).await
    }

    async fn deliver(
        &self,
        phone: &str,
        code: &str,
        payload: Option<&str>,
    ) -> Result<SendAuthCodeResult, SendAuthCodeError> {
        let phone = PhoneNumber::new(phone)?;
        let code = AuthCode::new(code)?;

        let result = self.strategy.send_auth_code(&phone, &code, payload).await;

        #[cfg(feature = "tracing")]
        match &result {
            Ok(result) => info!(telegram_way = result.telegram_way, "Auth code delivered"),
            Err(err) => warn!(error = %err, "Auth code not delivered"),
        }

        result
    }

    /// Send `text` through the single carrier selected for the phone's region.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsFacade::send_sms", skip_all, fields(phone = %mask_phone(phone)))
    )]
    pub async fn send_sms(&self, phone: &str, text: &str) -> Result<DeliveryId, SendSmsError> {
        let phone = PhoneNumber::new(phone)?;
        let provider = self.selector.select_provider(&phone, self.providers())?;

        #[cfg(feature = "tracing")]
        debug!(provider = %provider.name(), "Provider selected");

        Ok(provider.send_sms(&phone, text, None).await?)
    }

    /// Run every health check concurrently, chat gateway included.
    ///
    /// Health is informative only; an unhealthy carrier is still tried by
    /// `send_auth_code`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsFacade::health_check_all", skip_all)
    )]
    pub async fn health_check_all(&self) -> Result<(), AggregateHealthError> {
        let chat = self.chat();
        let chat_check = async { (chat.name().to_string(), chat.health_check().await) };
        let carrier_checks = join_all(
            self.providers()
                .iter()
                .map(|provider| async move { (provider.name().to_string(), provider.health_check().await) }),
        );

        let (chat_result, carrier_results) = join(chat_check, carrier_checks).await;
        let unhealthy: Vec<String> = std::iter::once(chat_result)
            .chain(carrier_results)
            .filter(|(_, healthy)| !healthy)
            .map(|(name, _)| name)
            .collect();

        if unhealthy.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        warn!(unhealthy = ?unhealthy, "Health check failed");

        Err(AggregateHealthError { unhealthy })
    }
}

impl<S: KeyValueStore> SmsFacade<TelegramProvider, AnyProvider, S> {
    /// Build the chat gateway and every configured carrier through `factory`.
    ///
    /// Fails fast on an unknown or misconfigured name.
    pub fn from_factory(factory: &ProviderFactory, store: S, config: SmsFacadeConfig) -> Result<Self, ProviderConfigError> {
        let chat = factory.create_telegram(&config.chat_provider)?;
        let providers = config
            .provider_names
            .iter()
            .map(|name| factory.create_provider(name))
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "tracing")]
        info!(providers = ?config.provider_names, chat = %config.chat_provider, "SMS facade ready");

        Ok(Self::new(chat, providers, store, config))
    }

    /// Same as [`SmsFacade::from_factory`] with a factory using the configured
    /// request timeout.
    pub fn from_registry(registry: ProviderRegistry, store: S, config: SmsFacadeConfig) -> Result<Self, ProviderConfigError> {
        let factory = ProviderFactory::new(registry, config.request_timeout)?;
        Self::from_factory(&factory, store, config)
    }
}

impl<C, P, S> AuthCodeService for SmsFacade<C, P, S>
where
    C: ChatGateway,
    P: SmsProvider,
    S: KeyValueStore,
{
    type Error = SendAuthCodeError;

    async fn send_auth_code(&self, phone: &str, code: &str) -> Result<SendAuthCodeResult, Self::Error> {
        SmsFacade::send_auth_code(self, phone, code).await
    }

    async fn health_check_all(&self) -> Result<(), AggregateHealthError> {
        SmsFacade::health_check_all(self).await
    }
}
