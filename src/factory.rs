//! Provider registry and factory.

use crate::errors::ProviderConfigError;
use crate::providers::green_sms::{self, GreenSmsProvider};
use crate::providers::sms_aero::{self, SmsAeroProvider};
use crate::providers::telegram::{self, TelegramGateway, TelegramProvider};
use crate::providers::twilio::{self, TwilioProvider};
use crate::providers::AnyProvider;
use crate::transport::{DEFAULT_TIMEOUT, HttpService};
use crate::types::PhoneNumber;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Names the factory knows how to build.
pub const SUPPORTED_PROVIDERS: [&str; 4] = [
    telegram::client::NAME,
    green_sms::NAME,
    sms_aero::NAME,
    twilio::NAME,
];

/// Prefix of provider settings in the environment.
pub const ENV_PREFIX: &str = "SMS_PROVIDER__";

/// Credentials of one provider.
pub type ProviderCredentials = BTreeMap<String, String>;

/// Logical provider name → credentials.
///
/// Deserializes from a plain map:
///
/// ```rust
/// use otp_gateway::ProviderRegistry;
///
/// let registry: ProviderRegistry = serde_json::from_str(
///     r#"{"green": {"user": "login", "pass": "secret"}}"#,
/// ).unwrap();
/// assert_eq!(registry.names(), vec!["green".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderCredentials>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credentials of `name`.
    pub fn with_provider<I, K, V>(mut self, name: impl Into<String>, credentials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let credentials = credentials
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.providers.insert(name.into(), credentials);
        self
    }

    /// Read `SMS_PROVIDER__<NAME>__<KEY>=value` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`ProviderRegistry::from_env`] over an explicit variable list.
    /// Names and keys are lowercased; unrelated variables are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut providers: BTreeMap<String, ProviderCredentials> = BTreeMap::new();
        for (key, value) in vars {
            let Some(rest) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let Some((name, field)) = rest.split_once("__") else {
                continue;
            };
            if name.is_empty() || field.is_empty() {
                continue;
            }
            providers
                .entry(name.to_lowercase())
                .or_default()
                .insert(field.to_lowercase(), value.into());
        }
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&ProviderCredentials> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

/// Builds configured providers by logical name.
///
/// Supported names: `telegram`, `green`, `aero`, `twilio`. Every key may also
/// carry an `endpoint` override.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    registry: ProviderRegistry,
    http: HttpService,
}

impl ProviderFactory {
    /// Create a factory sharing one HTTP client with the given timeout.
    pub fn new(registry: ProviderRegistry, timeout: Duration) -> Result<Self, ProviderConfigError> {
        let http = HttpService::new(timeout).map_err(ProviderConfigError::BuildHttpClient)?;
        Ok(Self::with_http(registry, http))
    }

    /// Create a factory with the default timeout.
    pub fn from_registry(registry: ProviderRegistry) -> Result<Self, ProviderConfigError> {
        Self::new(registry, DEFAULT_TIMEOUT)
    }

    pub fn with_http(registry: ProviderRegistry, http: HttpService) -> Self {
        Self { registry, http }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Registered names that [`ProviderFactory::create_provider`] can build.
    /// Entries under unsupported names are left out.
    pub fn list_available(&self) -> Vec<String> {
        self.registry
            .names()
            .into_iter()
            .filter(|name| SUPPORTED_PROVIDERS.contains(&name.as_str()))
            .collect()
    }

    fn credentials(&self, name: &str) -> Result<&ProviderCredentials, ProviderConfigError> {
        self.registry
            .get(name)
            .ok_or_else(|| ProviderConfigError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Build the provider registered under `name`.
    pub fn create_provider(&self, name: &str) -> Result<AnyProvider, ProviderConfigError> {
        let credentials = self.credentials(name)?;

        #[cfg(feature = "tracing")]
        debug!(provider = %name, "Creating provider");

        let provider = match name {
            telegram::client::NAME => self.build_telegram(credentials)?.into(),
            green_sms::NAME => self.build_green(credentials)?.into(),
            sms_aero::NAME => self.build_aero(credentials)?.into(),
            twilio::NAME => self.build_twilio(credentials)?.into(),
            _ => {
                return Err(ProviderConfigError::UnknownProvider {
                    name: name.to_string(),
                });
            }
        };
        Ok(provider)
    }

    /// Build the chat gateway registered under `name` as its concrete type.
    pub fn create_telegram(&self, name: &str) -> Result<TelegramProvider, ProviderConfigError> {
        let credentials = self.credentials(name)?;
        self.build_telegram(credentials)
    }

    fn build_telegram(&self, credentials: &ProviderCredentials) -> Result<TelegramProvider, ProviderConfigError> {
        let name = telegram::client::NAME;
        let mut builder = TelegramGateway::builder(required(credentials, "token")).http(self.http.clone());
        if let Some(endpoint) = endpoint(name, credentials)? {
            builder = builder.endpoint(endpoint);
        }

        let mut provider = TelegramProvider::new(builder.build()?);
        if let Some(sender) = credentials.get("sender_username") {
            provider = provider.with_sender_username(sender.clone());
        }
        if let Some(phone) = credentials.get("health_check_phone") {
            let phone = PhoneNumber::new(phone)
                .map_err(|e| ProviderConfigError::invalid(name, format!("health_check_phone: {e}")))?;
            provider = provider.with_health_check_phone(phone);
        }
        if let Some(cost) = credentials.get("daily_estimated_cost") {
            let cost = cost
                .parse::<f64>()
                .map_err(|e| ProviderConfigError::invalid(name, format!("daily_estimated_cost: {e}")))?;
            provider = provider.with_daily_estimated_cost(cost);
        }
        Ok(provider)
    }

    fn build_green(&self, credentials: &ProviderCredentials) -> Result<GreenSmsProvider, ProviderConfigError> {
        let mut builder = GreenSmsProvider::builder(
            required(credentials, "user"),
            required(credentials, "pass"),
        )
        .http(self.http.clone());
        if let Some(sender) = credentials.get("sender") {
            builder = builder.sender(sender.clone());
        }
        if let Some(endpoint) = endpoint(green_sms::NAME, credentials)? {
            builder = builder.endpoint(endpoint);
        }
        builder.build()
    }

    fn build_aero(&self, credentials: &ProviderCredentials) -> Result<SmsAeroProvider, ProviderConfigError> {
        let mut builder = SmsAeroProvider::builder(
            required(credentials, "email"),
            required(credentials, "api_key"),
        )
        .http(self.http.clone());
        if let Some(sign) = credentials.get("sign") {
            builder = builder.sign(sign.clone());
        }
        if let Some(endpoint) = endpoint(sms_aero::NAME, credentials)? {
            builder = builder.endpoint(endpoint);
        }
        builder.build()
    }

    fn build_twilio(&self, credentials: &ProviderCredentials) -> Result<TwilioProvider, ProviderConfigError> {
        let mut builder = TwilioProvider::builder(
            required(credentials, "account_sid"),
            required(credentials, "auth_token"),
            required(credentials, "from"),
        )
        .http(self.http.clone());
        if let Some(endpoint) = endpoint(twilio::NAME, credentials)? {
            builder = builder.endpoint(endpoint);
        }
        builder.build()
    }
}

/// Missing keys come back empty and are rejected by the provider builders.
fn required(credentials: &ProviderCredentials, key: &str) -> String {
    credentials.get(key).cloned().unwrap_or_default()
}

fn endpoint(provider: &str, credentials: &ProviderCredentials) -> Result<Option<Url>, ProviderConfigError> {
    credentials
        .get("endpoint")
        .map(|raw| Url::parse(raw).map_err(|e| ProviderConfigError::invalid(provider, format!("endpoint: {e}"))))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SmsProvider;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider("green", [("user", "login"), ("pass", "pw")])
            .with_provider("aero", [("email", "ops@example.com"), ("api_key", "key")])
            .with_provider(
                "twilio",
                [("account_sid", "AC1"), ("auth_token", "tok"), ("from", "+15005550006")],
            )
            .with_provider("telegram", [("token", "tg"), ("health_check_phone", "+79990000000")])
    }

    fn factory(registry: ProviderRegistry) -> ProviderFactory {
        ProviderFactory::from_registry(registry).unwrap()
    }

    #[test]
    fn test_create_every_provider() {
        let factory = factory(registry());
        for name in ["green", "aero", "twilio", "telegram"] {
            let provider = factory.create_provider(name).unwrap();
            assert_eq!(provider.name(), name);
        }
        assert!(matches!(factory.create_provider("aero").unwrap(), AnyProvider::Aero(_)));
    }

    #[test]
    fn test_unknown_provider() {
        let err = factory(registry()).create_provider("smsc").unwrap_err();
        assert!(matches!(err, ProviderConfigError::UnknownProvider { ref name } if name == "smsc"));
    }

    #[test]
    fn test_registered_but_unsupported_name_is_unknown() {
        let registry = ProviderRegistry::new().with_provider("smsc", [("login", "x")]);
        let err = factory(registry).create_provider("smsc").unwrap_err();
        assert!(matches!(err, ProviderConfigError::UnknownProvider { .. }));
    }

    #[test]
    fn test_list_available_skips_unsupported_names() {
        let only_unsupported = ProviderRegistry::new().with_provider("smsc", [("login", "x")]);
        assert!(factory(only_unsupported).list_available().is_empty());

        let mixed = registry().with_provider("smsc", [("login", "x")]);
        let factory = factory(mixed);
        let available = factory.list_available();
        assert!(!available.contains(&"smsc".to_string()));
        for name in &available {
            assert!(factory.create_provider(name).is_ok(), "{name} listed but not buildable");
        }
    }

    #[test]
    fn test_missing_credentials() {
        let registry = ProviderRegistry::new().with_provider("green", [("user", "login")]);
        let err = factory(registry).create_provider("green").unwrap_err();
        assert!(matches!(err, ProviderConfigError::InvalidProviderConfig { ref provider, .. } if provider == "green"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let registry = ProviderRegistry::new()
            .with_provider("green", [("user", "login"), ("pass", "pw"), ("endpoint", "not a url")]);
        let err = factory(registry).create_provider("green").unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_invalid_health_check_phone() {
        let registry = ProviderRegistry::new()
            .with_provider("telegram", [("token", "tg"), ("health_check_phone", "abc")]);
        assert!(factory(registry).create_telegram("telegram").is_err());
    }

    #[test]
    fn test_list_available_is_sorted() {
        assert_eq!(
            factory(registry()).list_available(),
            vec!["aero", "green", "telegram", "twilio"]
        );
    }

    #[test]
    fn test_from_vars() {
        let registry = ProviderRegistry::from_vars([
            ("SMS_PROVIDER__GREEN__USER", "login"),
            ("SMS_PROVIDER__GREEN__PASS", "pw"),
            ("SMS_PROVIDER__TWILIO__ACCOUNT_SID", "AC1"),
            ("SMS_PROVIDER____X", "ignored"),
            ("SMS_PROVIDER__BROKEN", "ignored"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(registry.names(), vec!["green", "twilio"]);
        let green = registry.get("green").unwrap();
        assert_eq!(green.get("user").map(String::as_str), Some("login"));
        assert_eq!(green.get("pass").map(String::as_str), Some("pw"));
    }

    #[test]
    fn test_deserialize_registry() {
        let registry: ProviderRegistry = serde_json::from_value(serde_json::json!({
            "aero": {"email": "ops@example.com", "api_key": "key", "sign": "Acme"}
        }))
        .unwrap();
        assert!(registry.contains("aero"));
        assert!(factory(registry).create_provider("aero").is_ok());
    }
}
