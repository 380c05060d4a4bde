//! GreenSMS regional carrier.
//!
//! - `POST /sms/send {to, txt, from?}` → `{request_id}`
//! - `GET /sms/status?id=` → `{status_code}`
//! - `GET /account/balance` → `{balance}`

use crate::errors::{ProviderConfigError, ProviderDeliveryError};
use crate::providers::traits::{SendMeta, SmsProvider};
use crate::transport::{DEFAULT_TIMEOUT, HttpRequest, HttpService};
use crate::types::{DeliveryId, PhoneNumber};
use crate::utils::phone::{clean_text, format_phone};
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use crate::utils::phone::mask_phone;
#[cfg(feature = "tracing")]
use tracing::{error, info, warn};

/// Default GreenSMS API URL.
pub const DEFAULT_API_URL: &str = "https://api3.greensms.ru/";

pub(crate) const NAME: &str = "green";

#[derive(Debug, Deserialize)]
struct SendResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_code: i64,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: f64,
}

/// GreenSMS provider.
#[derive(Clone)]
pub struct GreenSmsProvider {
    http: HttpService,
    user: String,
    pass: SecretString,
    sender: Option<String>,
    endpoint: Url,
}

impl std::fmt::Debug for GreenSmsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenSmsProvider")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("sender", &self.sender)
            .finish()
    }
}

/// Builder for [`GreenSmsProvider`].
pub struct GreenSmsProviderBuilder {
    user: String,
    pass: String,
    sender: Option<String>,
    endpoint: Option<Url>,
    http: Option<HttpService>,
    timeout: Duration,
}

impl GreenSmsProviderBuilder {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            sender: None,
            endpoint: None,
            http: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sender name shown to the recipient.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
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

    pub fn build(self) -> Result<GreenSmsProvider, ProviderConfigError> {
        if self.user.trim().is_empty() {
            return Err(ProviderConfigError::invalid(NAME, "missing `user`"));
        }
        if self.pass.trim().is_empty() {
            return Err(ProviderConfigError::invalid(NAME, "missing `pass`"));
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

        Ok(GreenSmsProvider {
            http,
            user: self.user,
            pass: SecretString::from(self.pass),
            sender: self.sender,
            endpoint,
        })
    }
}

impl GreenSmsProvider {
    pub fn builder(user: impl Into<String>, pass: impl Into<String>) -> GreenSmsProviderBuilder {
        GreenSmsProviderBuilder::new(user, pass)
    }

    fn url(&self, path: &str) -> Result<Url, ProviderDeliveryError> {
        self.endpoint
            .join(path)
            .map_err(|e| ProviderDeliveryError::unexpected(NAME, e.to_string()))
    }

    async fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ProviderDeliveryError> {
        let request = request.basic_auth(&self.user, &self.pass);
        match self.http.request::<T>(request).await {
            Ok(response) => Ok(response.data),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!(error = %_e, "GreenSMS API error");
                Err(ProviderDeliveryError::transport(NAME, _e))
            }
        }
    }

    /// Carrier status code of a previously sent message.
    pub async fn delivery_status(&self, id: &DeliveryId) -> Result<i64, ProviderDeliveryError> {
        let request = HttpRequest::get(self.url("sms/status")?).param("id", id.as_ref());
        let response: StatusResponse = self.execute(request).await?;
        Ok(response.status_code)
    }

    /// Current account balance.
    pub async fn balance(&self) -> Result<f64, ProviderDeliveryError> {
        let request = HttpRequest::get(self.url("account/balance")?);
        let response: BalanceResponse = self.execute(request).await?;
        Ok(response.balance)
    }
}

impl SmsProvider for GreenSmsProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "GreenSmsProvider::send_sms",
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

        let mut body = serde_json::json!({
            "to": format_phone(phone.as_str()),
            "txt": text,
        });
        if let Some(sender) = &self.sender {
            body["from"] = serde_json::Value::String(sender.clone());
        }

        let request = HttpRequest::post(self.url("sms/send")?).json(body);
        let response: SendResponse = self.execute(request).await?;

        #[cfg(feature = "tracing")]
        info!(request_id = %response.request_id, "GreenSMS: SMS sent");

        Ok(DeliveryId::new(response.request_id))
    }

    async fn health_check(&self) -> bool {
        match self.balance().await {
            Ok(_) => true,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "GreenSMS healthCheck failed");
                false
            }
        }
    }
}
