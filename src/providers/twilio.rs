//! Twilio international gateway.

use crate::errors::{ProviderConfigError, ProviderDeliveryError};
use crate::providers::traits::{SendMeta, SmsProvider};
use crate::transport::{DEFAULT_TIMEOUT, HttpRequest, HttpService};
use crate::types::{DeliveryId, PhoneNumber};
use crate::utils::phone::{clean_text, format_phone};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use crate::utils::phone::mask_phone;
#[cfg(feature = "tracing")]
use tracing::{error, info, warn};

/// Default Twilio API URL.
pub const DEFAULT_API_URL: &str = "https://api.twilio.com/";

const API_VERSION: &str = "2010-04-01";

pub(crate) const NAME: &str = "twilio";

/// Created message resource.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioMessage {
    pub sid: String,
    pub status: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResource {
    status: String,
}

/// Twilio provider.
#[derive(Clone)]
pub struct TwilioProvider {
    http: HttpService,
    account_sid: String,
    auth_token: SecretString,
    from: String,
    endpoint: Url,
}

impl std::fmt::Debug for TwilioProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioProvider")
            .field("endpoint", &self.endpoint)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

/// Builder for [`TwilioProvider`].
pub struct TwilioProviderBuilder {
    account_sid: String,
    auth_token: String,
    from: String,
    endpoint: Option<Url>,
    http: Option<HttpService>,
    timeout: Duration,
}

impl TwilioProviderBuilder {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            endpoint: None,
            http: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn http(mut self, http: HttpService) -> Self {
        self.http = Some(http);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<TwilioProvider, ProviderConfigError> {
        for (key, value) in [
            ("account_sid", &self.account_sid),
            ("auth_token", &self.auth_token),
            ("from", &self.from),
        ] {
            if value.trim().is_empty() {
                return Err(ProviderConfigError::invalid(NAME, format!("missing `{key}`")));
            }
        }

        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => Url::parse(DEFAULT_API_URL)
                .map_err(|e| ProviderConfigError::invalid(NAME, e.to_string()))?,
        };
        let http = match self.http {
            Some(http) => http,
            None => HttpService::new(self.timeout).map_err(ProviderConfigError::BuildHttpClient)?,
        };

        Ok(TwilioProvider {
            http,
            account_sid: self.account_sid,
            auth_token: SecretString::from(self.auth_token),
            from: self.from,
            endpoint,
        })
    }
}

impl TwilioProvider {
    pub fn builder(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> TwilioProviderBuilder {
        TwilioProviderBuilder::new(account_sid, auth_token, from)
    }

    fn account_url(&self, suffix: &str) -> Result<Url, ProviderDeliveryError> {
        let path = format!("{API_VERSION}/Accounts/{}{suffix}", self.account_sid);
        self.endpoint
            .join(&path)
            .map_err(|e| ProviderDeliveryError::unexpected(NAME, e.to_string()))
    }

    /// Create a message resource.
    pub async fn create_message(&self, to: &str, body: &str) -> Result<TwilioMessage, ProviderDeliveryError> {
        let request = HttpRequest::post(self.account_url("/Messages.json")?)
            .basic_auth(&self.account_sid, &self.auth_token)
            .form(vec![
                ("To".to_string(), to.to_string()),
                ("From".to_string(), self.from.clone()),
                ("Body".to_string(), body.to_string()),
            ]);

        match self.http.request::<TwilioMessage>(request).await {
            Ok(response) => Ok(response.data),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!(error = %_e, "Twilio sendSms failed");
                Err(ProviderDeliveryError::transport(NAME, _e))
            }
        }
    }
}

impl SmsProvider for TwilioProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TwilioProvider::send_sms",
            skip_all,
            fields(phone = %mask_phone(phone.as_str()))
        )
    )]
    async fn send_sms(
        &self,
        phone: &PhoneNumber,
        text: &str,
        _meta: Option<&SendMeta>,
    ) -> Result<DeliveryId, ProviderDeliveryError> {
        let text = clean_text(text);
        if text.is_empty() {
            return Err(ProviderDeliveryError::InvalidInput {
                provider: NAME.to_string(),
                reason: "text is required".to_string(),
            });
        }

        let to = format!("+{}", format_phone(phone.as_str()));
        let message = self.create_message(&to, &text).await?;

        #[cfg(feature = "tracing")]
        info!(sid = %message.sid, status = ?message.status, "Twilio: SMS sent");

        Ok(DeliveryId::new(message.sid))
    }

    /// Fetches the account resource and requires it to be active.
    async fn health_check(&self) -> bool {
        let url = match self.account_url(".json") {
            Ok(url) => url,
            Err(_) => return false,
        };
        let request = HttpRequest::get(url).basic_auth(&self.account_sid, &self.auth_token);

        match self.http.request::<AccountResource>(request).await {
            Ok(response) => response.data.status == "active",
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Twilio healthCheck failed");
                false
            }
        }
    }
}
