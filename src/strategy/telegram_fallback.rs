//! Chat-first delivery with regional SMS fallback.

use super::{FallbackOrder, PhoneLocks, ProviderSelectionStrategy, SelectionError};
use crate::providers::{ChatGateway, SendMeta, SmsProvider};
use crate::service::SendAuthCodeError;
use crate::store::{KeyValueStore, PendingChatRequest, PendingRequestStore};
use crate::types::{AuthCode, PhoneNumber, RequestId, SendAuthCodeResult};
use crate::utils::phone::mask_phone;
use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{info, warn};

/// Default regional message. `{code}` is replaced with the code.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "Your code is {code}";

/// Why the chat channel did not deliver. Never returned to callers; logged
/// before falling back.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatChannelError {
    /// The gateway answered the ability check with `ok = false`.
    #[error("chat gateway cannot serve {phone}: {reason}")]
    AbilityDenied { phone: String, reason: String },

    /// A step of the chat flow failed.
    #[error("chat delivery to {phone} failed at {context}: {cause}")]
    Failed {
        phone: String,
        cause: String,
        context: &'static str,
    },
}

impl ChatChannelError {
    fn failed(phone: &PhoneNumber, context: &'static str, cause: impl ToString) -> Self {
        Self::Failed {
            phone: mask_phone(phone.as_str()),
            cause: cause.to_string(),
            context,
        }
    }
}

/// Chat-first strategy.
///
/// 1. A live pending request for the phone is reused without a new ability check.
/// 2. Otherwise the gateway is asked whether it can serve the phone, and the
///    request it hands out is stored for an hour before sending.
/// 3. A successful chat send deletes the pending request.
/// 4. Any chat failure falls back to the regional carriers for the phone's
///    region, tried once each in order.
///
/// Steps 1 and 2 run under a per-phone lock, and the pending request is
/// written with `set_if_absent` so concurrent callers in other processes
/// converge on one request.
pub struct TelegramFallbackStrategy<C, P, S> {
    chat: C,
    providers: Vec<P>,
    pending: PendingRequestStore<S>,
    order: FallbackOrder,
    locks: PhoneLocks,
    message_template: String,
}

impl<C, P, S> TelegramFallbackStrategy<C, P, S>
where
    C: ChatGateway,
    P: SmsProvider,
    S: KeyValueStore,
{
    pub fn new(chat: C, providers: Vec<P>, pending: PendingRequestStore<S>) -> Self {
        Self {
            chat,
            providers,
            pending,
            order: FallbackOrder::default(),
            locks: PhoneLocks::new(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }

    pub fn with_fallback_order(mut self, order: FallbackOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    /// Share locks with other strategies in the process.
    pub fn with_locks(mut self, locks: PhoneLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn providers(&self) -> &[P] {
        &self.providers
    }

    pub fn pending(&self) -> &PendingRequestStore<S> {
        &self.pending
    }

    /// Deliver `code` to `phone`, chat first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TelegramFallbackStrategy::send_auth_code",
            skip_all,
            fields(phone = %mask_phone(phone.as_str()))
        )
    )]
    pub async fn send_auth_code(
        &self,
        phone: &PhoneNumber,
        code: &AuthCode,
        payload: Option<&str>,
    ) -> Result<SendAuthCodeResult, SendAuthCodeError> {
        let chat_result = {
            let _guard = self.locks.lock(phone).await;
            self.send_via_chat(phone, code, payload).await
        };

        match chat_result {
            Ok(()) => {
                return Ok(SendAuthCodeResult {
                    code: code.clone(),
                    telegram_way: true,
                });
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                warn!(
                    error = %serde_json::to_string(&_err).unwrap_or_else(|_| _err.to_string()),
                    "Telegram failed, falling back to SMS"
                );
            }
        }

        self.send_via_fallback(phone, code).await
    }

    async fn send_via_chat(
        &self,
        phone: &PhoneNumber,
        code: &AuthCode,
        payload: Option<&str>,
    ) -> Result<(), ChatChannelError> {
        let stored = self
            .pending
            .get(phone)
            .await
            .map_err(|e| ChatChannelError::failed(phone, "read_pending", e))?;

        if let Some(stored) = stored.filter(PendingChatRequest::is_live) {
            #[cfg(feature = "tracing")]
            info!("Using stored requestId");

            self.send_chat(phone, code, payload, stored.request_id, "send_stored")
                .await?;
            self.consume(phone).await;
            return Ok(());
        }

        let ability = self
            .chat
            .check_send_ability(phone)
            .await
            .map_err(|e| ChatChannelError::failed(phone, "check_send_ability", e))?;
        if !ability.ok {
            return Err(ChatChannelError::AbilityDenied {
                phone: mask_phone(phone.as_str()),
                reason: ability.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        let request_id = ability.request_id.ok_or_else(|| {
            ChatChannelError::failed(phone, "check_send_ability", "no request id in answer")
        })?;

        let request_id = self.save_pending(phone, request_id).await?;
        self.send_chat(phone, code, payload, request_id, "send").await?;
        self.consume(phone).await;
        Ok(())
    }

    /// Persist a fresh request, or adopt a live one another writer stored first.
    async fn save_pending(
        &self,
        phone: &PhoneNumber,
        request_id: RequestId,
    ) -> Result<RequestId, ChatChannelError> {
        let fresh = PendingChatRequest::new(request_id, self.pending.ttl());
        let written = self
            .pending
            .set_if_absent(phone, &fresh)
            .await
            .map_err(|e| ChatChannelError::failed(phone, "save_pending", e))?;
        if written {
            return Ok(fresh.request_id);
        }

        let existing = self
            .pending
            .get(phone)
            .await
            .map_err(|e| ChatChannelError::failed(phone, "save_pending", e))?;
        match existing.filter(PendingChatRequest::is_live) {
            Some(winner) => {
                #[cfg(feature = "tracing")]
                info!(request_id = %winner.request_id, "Reusing concurrently stored requestId");
                Ok(winner.request_id)
            }
            None => {
                self.pending
                    .set(phone, &fresh)
                    .await
                    .map_err(|e| ChatChannelError::failed(phone, "save_pending", e))?;
                Ok(fresh.request_id)
            }
        }
    }

    async fn send_chat(
        &self,
        phone: &PhoneNumber,
        code: &AuthCode,
        payload: Option<&str>,
        request_id: RequestId,
        context: &'static str,
    ) -> Result<(), ChatChannelError> {
        let mut meta = SendMeta::default()
            .with_code(code.clone())
            .with_request_id(request_id);
        if let Some(payload) = payload {
            meta = meta.with_payload(payload);
        }

        self.chat
            .send_sms(phone, code.as_str(), Some(&meta))
            .await
            .map(|_| ())
            .map_err(|e| ChatChannelError::failed(phone, context, e))
    }

    /// Drop the pending request after a delivered message. A failed delete
    /// leaves the entry to expire; the delivery itself stands.
    async fn consume(&self, phone: &PhoneNumber) {
        if let Err(_e) = self.pending.delete(phone).await {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Failed to delete pending request");
        }
    }

    async fn send_via_fallback(
        &self,
        phone: &PhoneNumber,
        code: &AuthCode,
    ) -> Result<SendAuthCodeResult, SendAuthCodeError> {
        #[cfg(feature = "tracing")]
        info!(region = %phone.region(), "Fallback to SMS");

        let text = self.message_template.replace("{code}", code.as_str());
        let mut attempted = Vec::new();

        for name in self.order.for_phone(phone) {
            let Some(provider) = self.providers.iter().find(|p| p.name() == name) else {
                continue;
            };
            attempted.push(name.clone());

            match provider.send_sms(phone, &text, None).await {
                Ok(_id) => {
                    #[cfg(feature = "tracing")]
                    info!(provider = %name, delivery_id = %_id, "Code sent via SMS");
                    return Ok(SendAuthCodeResult {
                        code: code.clone(),
                        telegram_way: false,
                    });
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!(provider = %name, error = %_e, "Provider failed");
                }
            }
        }

        Err(SendAuthCodeError::AllProvidersFailed {
            phone: phone.clone(),
            attempted,
        })
    }
}

/// First provider of the phone's fallback order that is present in `providers`.
impl<C, P, S> ProviderSelectionStrategy<P> for TelegramFallbackStrategy<C, P, S>
where
    C: ChatGateway,
    P: SmsProvider,
    S: KeyValueStore,
{
    fn select_provider<'a>(&self, phone: &PhoneNumber, providers: &'a [P]) -> Result<&'a P, SelectionError> {
        self.order
            .for_phone(phone)
            .iter()
            .find_map(|name| providers.iter().find(|p| p.name() == name))
            .ok_or_else(|| SelectionError::new(phone, providers))
    }
}
