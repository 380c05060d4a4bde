//! Telegram Gateway provider implementation.

use super::client::{NAME, TelegramGateway};
use super::types::SendVerificationMessage;
use crate::errors::ProviderDeliveryError;
use crate::providers::traits::{ChatGateway, SendAbility, SendMeta, SmsProvider};
use crate::types::{DeliveryId, PhoneNumber, RequestId};

#[cfg(feature = "tracing")]
use crate::utils::phone::mask_phone;
#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// Default message lifetime in seconds.
pub const DEFAULT_MESSAGE_TTL: u32 = 60;

/// Default daily spend used for the low-balance warning.
pub const DEFAULT_DAILY_ESTIMATED_COST: f64 = 100.0;

/// Telegram Gateway provider.
///
/// Wraps [`TelegramGateway`] and implements [`SmsProvider`] and [`ChatGateway`].
#[derive(Debug, Clone)]
pub struct TelegramProvider {
    client: TelegramGateway,
    sender_username: Option<String>,
    health_check_phone: Option<PhoneNumber>,
    daily_estimated_cost: f64,
    message_ttl: u32,
}

impl TelegramProvider {
    /// Create a new Telegram provider.
    pub fn new(client: TelegramGateway) -> Self {
        Self {
            client,
            sender_username: None,
            health_check_phone: None,
            daily_estimated_cost: DEFAULT_DAILY_ESTIMATED_COST,
            message_ttl: DEFAULT_MESSAGE_TTL,
        }
    }

    /// Channel to send from, if the account owns one.
    pub fn with_sender_username(mut self, sender: impl Into<String>) -> Self {
        self.sender_username = Some(sender.into());
        self
    }

    /// Phone checked by [`SmsProvider::health_check`].
    pub fn with_health_check_phone(mut self, phone: PhoneNumber) -> Self {
        self.health_check_phone = Some(phone);
        self
    }

    /// Balance below which [`TelegramProvider::balance`] warns.
    pub fn with_daily_estimated_cost(mut self, cost: f64) -> Self {
        self.daily_estimated_cost = cost;
        self
    }

    pub fn with_message_ttl(mut self, ttl: u32) -> Self {
        self.message_ttl = ttl;
        self
    }

    /// Get reference to the inner client.
    pub fn client(&self) -> &TelegramGateway {
        &self.client
    }

    /// Whether the account balance can pay for deliveries to `phone`.
    ///
    /// Returns `false` when the gateway refuses, when the balance is missing
    /// or not a finite number, or when it is zero or negative.
    pub async fn balance(&self, phone: &PhoneNumber) -> bool {
        let ability = match self.check_send_ability(phone).await {
            Ok(ability) => ability,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "TelegramProvider.balance - check failed");
                return false;
            }
        };

        if !ability.ok {
            #[cfg(feature = "tracing")]
            warn!(
                phone = %mask_phone(phone.as_str()),
                "TelegramProvider.balance - invalid response from checkSendAbility"
            );
            return false;
        }

        let remaining = match ability.remaining_balance {
            Some(balance) if balance.is_finite() => balance,
            _ => {
                #[cfg(feature = "tracing")]
                error!(
                    remaining_balance = ?ability.remaining_balance,
                    "TelegramProvider.balance - invalid remaining balance"
                );
                return false;
            }
        };

        if remaining <= 0.0 {
            #[cfg(feature = "tracing")]
            debug!(remaining_balance = remaining, "TelegramProvider.balance - balance is empty");
            return false;
        }

        #[cfg(feature = "tracing")]
        info!(
            remaining_balance = remaining,
            request_cost = ?ability.request_cost,
            "TelegramProvider.balance - current balance"
        );

        if remaining < self.daily_estimated_cost {
            #[cfg(feature = "tracing")]
            warn!(
                remaining_balance = remaining,
                daily_estimated_cost = self.daily_estimated_cost,
                "TelegramProvider.balance - low balance"
            );
        }

        true
    }
}

impl SmsProvider for TelegramProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TelegramProvider::send_sms",
            skip_all,
            fields(phone = %mask_phone(phone.as_str()))
        )
    )]
    async fn send_sms(
        &self,
        phone: &PhoneNumber,
        text: &str,
        meta: Option<&SendMeta>,
    ) -> Result<DeliveryId, ProviderDeliveryError> {
        if text.trim().is_empty() {
            return Err(ProviderDeliveryError::InvalidInput {
                provider: NAME.to_string(),
                reason: "text is required".to_string(),
            });
        }

        let meta = meta.cloned().unwrap_or_default();
        let body = SendVerificationMessage {
            phone_number: phone.to_string(),
            payload: meta.payload.unwrap_or_else(|| text.to_string()),
            ttl: meta.ttl.unwrap_or(self.message_ttl),
            code: meta.code.map(|code| code.to_string()),
            code_length: meta.code_length,
            request_id: meta.request_id.map(|id| id.to_string()),
            sender_username: self.sender_username.clone(),
        };

        let status = self.client.send_verification_message(&body).await?;

        #[cfg(feature = "tracing")]
        debug!(request_id = %status.request_id, "Verification message sent");

        Ok(DeliveryId::new(status.request_id))
    }

    async fn health_check(&self) -> bool {
        let Some(phone) = &self.health_check_phone else {
            #[cfg(feature = "tracing")]
            warn!("TelegramProvider healthCheck skipped: no health check phone configured");
            return false;
        };

        match self.check_send_ability(phone).await {
            Ok(ability) => ability.ok,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "TelegramProvider healthCheck failed");
                false
            }
        }
    }
}

impl ChatGateway for TelegramProvider {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TelegramProvider::check_send_ability",
            skip_all,
            fields(phone = %mask_phone(phone.as_str()))
        )
    )]
    async fn check_send_ability(
        &self,
        phone: &PhoneNumber,
    ) -> Result<SendAbility, ProviderDeliveryError> {
        let response = self.client.check_send_ability(phone.as_str()).await?;

        if !response.ok {
            return Ok(SendAbility {
                ok: false,
                request_id: None,
                remaining_balance: None,
                request_cost: None,
                error: response.error,
            });
        }

        let status = response
            .result
            .ok_or_else(|| ProviderDeliveryError::unexpected(NAME, "checkSendAbility returned no result"))?;

        Ok(SendAbility {
            ok: true,
            request_id: Some(RequestId::new(status.request_id)),
            remaining_balance: status.remaining_balance,
            request_cost: status.request_cost,
            error: None,
        })
    }

    async fn check_verification_status(
        &self,
        request_id: &RequestId,
    ) -> Result<bool, ProviderDeliveryError> {
        let status = self.client.check_verification_status(request_id).await?;
        Ok(status
            .verification_status
            .map(|verification| verification.is_valid())
            .unwrap_or(false))
    }

    async fn revoke_verification_message(
        &self,
        request_id: &RequestId,
    ) -> Result<bool, ProviderDeliveryError> {
        self.client.revoke_verification_message(request_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthCode;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(mock_server: &MockServer) -> TelegramProvider {
        let client = TelegramGateway::builder("test_token")
            .endpoint(Url::parse(&mock_server.uri()).unwrap())
            .build()
            .unwrap();
        TelegramProvider::new(client)
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+79991234567").unwrap()
    }

    async fn mount_ability(mock_server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/checkSendAbility"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_send_with_meta() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sendVerificationMessage"))
            .and(body_partial_json(serde_json::json!({
                "phone_number": "+79991234567",
                "payload": "login",
                "code": "4821",
                "request_id": "tg-1",
                "ttl": 60
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"request_id": "tg-1"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let meta = SendMeta::default()
            .with_code(AuthCode::new("4821").unwrap())
            .with_request_id(RequestId::from("tg-1"))
            .with_payload("login");
        let id = provider(&mock_server)
            .send_sms(&phone(), "4821", Some(&meta))
            .await
            .unwrap();
        assert_eq!(id.as_ref(), "tg-1");
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sendVerificationMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "error": "REQUEST_ID_INVALID"
            })))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .send_sms(&phone(), "4821", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderDeliveryError::Rejected { ref reason, .. } if reason == "REQUEST_ID_INVALID"));
    }

    #[tokio::test]
    async fn test_send_requires_text() {
        let mock_server = MockServer::start().await;
        let err = provider(&mock_server)
            .send_sms(&phone(), "  ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderDeliveryError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_check_send_ability_ok() {
        let mock_server = MockServer::start().await;
        mount_ability(
            &mock_server,
            serde_json::json!({
                "ok": true,
                "result": {"request_id": "tg-1", "remaining_balance": 50.0, "request_cost": 0.01}
            }),
        )
        .await;

        let ability = provider(&mock_server).check_send_ability(&phone()).await.unwrap();
        assert!(ability.ok);
        assert_eq!(ability.request_id, Some(RequestId::from("tg-1")));
        assert_eq!(ability.request_cost, Some(0.01));
    }

    #[tokio::test]
    async fn test_check_send_ability_denied() {
        let mock_server = MockServer::start().await;
        mount_ability(&mock_server, serde_json::json!({"ok": false, "error": "BALANCE_NOT_ENOUGH"})).await;

        let ability = provider(&mock_server).check_send_ability(&phone()).await.unwrap();
        assert!(!ability.ok);
        assert_eq!(ability.error.as_deref(), Some("BALANCE_NOT_ENOUGH"));
    }

    #[tokio::test]
    async fn test_health_check_without_phone_is_false() {
        let mock_server = MockServer::start().await;
        assert!(!provider(&mock_server).health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_uses_configured_phone() {
        let mock_server = MockServer::start().await;
        mount_ability(&mock_server, serde_json::json!({"ok": true, "result": {"request_id": "health-1"}})).await;

        let provider = provider(&mock_server).with_health_check_phone(phone());
        assert!(provider.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_swallows_transport_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server).with_health_check_phone(phone());
        assert!(!provider.health_check().await);
    }

    #[tokio::test]
    async fn test_balance() {
        let mock_server = MockServer::start().await;
        mount_ability(
            &mock_server,
            serde_json::json!({"ok": true, "result": {"request_id": "b", "remaining_balance": 5.0}}),
        )
        .await;

        // Low but positive balance still counts as available
        let provider = provider(&mock_server).with_daily_estimated_cost(10.0);
        assert!(provider.balance(&phone()).await);
    }

    #[tokio::test]
    async fn test_balance_empty_or_missing() {
        let mock_server = MockServer::start().await;
        mount_ability(
            &mock_server,
            serde_json::json!({"ok": true, "result": {"request_id": "b", "remaining_balance": 0.0}}),
        )
        .await;
        assert!(!provider(&mock_server).balance(&phone()).await);

        let mock_server = MockServer::start().await;
        mount_ability(&mock_server, serde_json::json!({"ok": true, "result": {"request_id": "b"}})).await;
        assert!(!provider(&mock_server).balance(&phone()).await);
    }

    #[tokio::test]
    async fn test_check_verification_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkVerificationStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"request_id": "tg-1", "verification_status": {"status": "code_invalid"}}
            })))
            .mount(&mock_server)
            .await;

        let valid = provider(&mock_server)
            .check_verification_status(&RequestId::from("tg-1"))
            .await
            .unwrap();
        assert!(!valid);
    }
}
