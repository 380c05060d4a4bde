//! Telegram Gateway HTTP client.

use super::types::{GatewayResponse, RequestStatus, SendVerificationMessage};
use crate::errors::{ProviderConfigError, ProviderDeliveryError};
use crate::transport::{DEFAULT_TIMEOUT, HttpRequest, HttpService};
use crate::types::RequestId;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use tracing::error;

/// Default Telegram Gateway API URL.
pub const DEFAULT_API_URL: &str = "https://gatewayapi.telegram.org/";

pub(crate) const NAME: &str = "telegram";

/// Telegram Gateway HTTP client.
///
/// Thin wrapper over the gateway methods. Every call is a JSON `POST` with a
/// bearer token; answers come wrapped in `{ok, result, error}`.
#[derive(Clone)]
pub struct TelegramGateway {
    http: HttpService,
    token: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for TelegramGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramGateway")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`TelegramGateway`].
pub struct TelegramGatewayBuilder {
    token: String,
    endpoint: Option<Url>,
    http: Option<HttpService>,
    timeout: Duration,
}

impl TelegramGatewayBuilder {
    /// Create a new builder with the given gateway token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: None,
            http: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom API endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Share an existing HTTP service.
    pub fn http(mut self, http: HttpService) -> Self {
        self.http = Some(http);
        self
    }

    /// Per-request timeout used when no HTTP service is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the [`TelegramGateway`].
    pub fn build(self) -> Result<TelegramGateway, ProviderConfigError> {
        if self.token.trim().is_empty() {
            return Err(ProviderConfigError::invalid(NAME, "missing `token`"));
        }

        let mut endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => Url::parse(DEFAULT_API_URL)
                .map_err(|e| ProviderConfigError::invalid(NAME, e.to_string()))?,
        };
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let http = match self.http {
            Some(http) => http,
            None => HttpService::new(self.timeout).map_err(ProviderConfigError::BuildHttpClient)?,
        };

        Ok(TelegramGateway {
            http,
            token: SecretString::from(self.token),
            endpoint,
        })
    }
}

impl TelegramGateway {
    /// Create a builder for configuring the client.
    pub fn builder(token: impl Into<String>) -> TelegramGatewayBuilder {
        TelegramGatewayBuilder::new(token)
    }

    /// Call a gateway method and return the raw envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<GatewayResponse<T>, ProviderDeliveryError> {
        let url = self.endpoint.join(method).map_err(|e| ProviderDeliveryError::InvalidInput {
            provider: NAME.to_string(),
            reason: e.to_string(),
        })?;

        let request = HttpRequest::post(url).bearer_auth(&self.token).json(body);

        match self.http.request::<GatewayResponse<T>>(request).await {
            Ok(response) => Ok(response.data),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!(method = method, error = %_e, "Telegram Gateway API error");
                Err(ProviderDeliveryError::transport(NAME, _e))
            }
        }
    }

    /// `sendVerificationMessage`.
    pub async fn send_verification_message(
        &self,
        body: &SendVerificationMessage,
    ) -> Result<RequestStatus, ProviderDeliveryError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ProviderDeliveryError::unexpected(NAME, e.to_string()))?;
        self.call::<RequestStatus>("sendVerificationMessage", body)
            .await?
            .into_result()
            .map_err(|reason| ProviderDeliveryError::rejected(NAME, reason))
    }

    /// `checkSendAbility`. The envelope is returned as is so a refusal is not an error.
    pub async fn check_send_ability(
        &self,
        phone_number: &str,
    ) -> Result<GatewayResponse<RequestStatus>, ProviderDeliveryError> {
        self.call("checkSendAbility", serde_json::json!({ "phone_number": phone_number }))
            .await
    }

    /// `checkVerificationStatus`.
    pub async fn check_verification_status(
        &self,
        request_id: &RequestId,
    ) -> Result<RequestStatus, ProviderDeliveryError> {
        self.call::<RequestStatus>(
            "checkVerificationStatus",
            serde_json::json!({ "request_id": request_id.as_ref() }),
        )
        .await?
        .into_result()
        .map_err(|reason| ProviderDeliveryError::rejected(NAME, reason))
    }

    /// `revokeVerificationMessage`.
    pub async fn revoke_verification_message(
        &self,
        request_id: &RequestId,
    ) -> Result<bool, ProviderDeliveryError> {
        self.call::<bool>(
            "revokeVerificationMessage",
            serde_json::json!({ "request_id": request_id.as_ref() }),
        )
        .await?
        .into_result()
        .map_err(|reason| ProviderDeliveryError::rejected(NAME, reason))
    }
}
