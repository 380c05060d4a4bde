//! Provider trait definitions.

use crate::errors::ProviderDeliveryError;
use crate::types::{AuthCode, DeliveryId, PhoneNumber, RequestId};
use std::future::Future;

/// Extra options for a chat-gateway delivery. Regional carriers ignore them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMeta {
    /// Code the gateway should deliver verbatim.
    pub code: Option<AuthCode>,
    /// Length of a gateway-generated code when `code` is absent.
    pub code_length: Option<u8>,
    /// Request obtained from a previous ability check.
    pub request_id: Option<RequestId>,
    /// Opaque payload echoed back by the gateway in reports.
    pub payload: Option<String>,
    /// Message lifetime in seconds.
    pub ttl: Option<u32>,
}

impl SendMeta {
    pub fn with_code(mut self, code: AuthCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// Answer of a chat gateway ability check.
#[derive(Debug, Clone, PartialEq)]
pub struct SendAbility {
    /// Whether the gateway can deliver to this phone.
    pub ok: bool,
    /// Request to pass to the subsequent send. Present when `ok`.
    pub request_id: Option<RequestId>,
    pub remaining_balance: Option<f64>,
    pub request_cost: Option<f64>,
    /// Refusal reason when not `ok`.
    pub error: Option<String>,
}

/// Core trait that every delivery channel implements.
///
/// - `send_sms` delivers `text` to `phone` and returns the channel's id for it
/// - `health_check` never fails; internal errors are reported as `false`
///
/// # Example
///
/// ```rust,ignore
/// use otp_gateway::{SmsProvider, SendMeta, PhoneNumber, DeliveryId, ProviderDeliveryError};
///
/// struct MyProvider;
///
/// impl SmsProvider for MyProvider {
///     fn name(&self) -> &str {
///         "mine"
///     }
///
///     async fn send_sms(
///         &self,
///         phone: &PhoneNumber,
///         text: &str,
///         meta: Option<&SendMeta>,
///     ) -> Result<DeliveryId, ProviderDeliveryError> {
///         // Call the channel
///     }
///
///     async fn health_check(&self) -> bool {
///         true
///     }
/// }
/// ```
pub trait SmsProvider: Send + Sync {
    /// Stable identifier used for routing, logging and cache keys.
    fn name(&self) -> &str;

    /// Attempt one delivery.
    fn send_sms(
        &self,
        phone: &PhoneNumber,
        text: &str,
        meta: Option<&SendMeta>,
    ) -> impl Future<Output = Result<DeliveryId, ProviderDeliveryError>> + Send;

    /// Report whether the channel is usable right now.
    fn health_check(&self) -> impl Future<Output = bool> + Send;
}

/// A provider that can also gate deliveries (chat verification gateways).
pub trait ChatGateway: SmsProvider {
    /// Ask whether the gateway can deliver to `phone` and reserve a request for it.
    fn check_send_ability(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<SendAbility, ProviderDeliveryError>> + Send;

    /// Whether the code delivered under `request_id` was entered correctly.
    fn check_verification_status(
        &self,
        request_id: &RequestId,
    ) -> impl Future<Output = Result<bool, ProviderDeliveryError>> + Send;

    /// Revoke a delivered message.
    fn revoke_verification_message(
        &self,
        request_id: &RequestId,
    ) -> impl Future<Output = Result<bool, ProviderDeliveryError>> + Send;
}
