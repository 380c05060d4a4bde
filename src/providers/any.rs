//! Closed set of built-in providers.

use super::green_sms::GreenSmsProvider;
use super::sms_aero::SmsAeroProvider;
use super::telegram::TelegramProvider;
use super::traits::{SendMeta, SmsProvider};
use super::twilio::TwilioProvider;
use crate::errors::ProviderDeliveryError;
use crate::types::{DeliveryId, PhoneNumber};

/// Any of the built-in providers, dispatched by `match`.
///
/// Lets the factory hand out a single concrete type for every registered
/// name so candidates can live in one `Vec`.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Telegram(TelegramProvider),
    Green(GreenSmsProvider),
    Aero(SmsAeroProvider),
    Twilio(TwilioProvider),
}

impl From<TelegramProvider> for AnyProvider {
    fn from(provider: TelegramProvider) -> Self {
        Self::Telegram(provider)
    }
}

impl From<GreenSmsProvider> for AnyProvider {
    fn from(provider: GreenSmsProvider) -> Self {
        Self::Green(provider)
    }
}

impl From<SmsAeroProvider> for AnyProvider {
    fn from(provider: SmsAeroProvider) -> Self {
        Self::Aero(provider)
    }
}

impl From<TwilioProvider> for AnyProvider {
    fn from(provider: TwilioProvider) -> Self {
        Self::Twilio(provider)
    }
}

impl SmsProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Telegram(p) => p.name(),
            Self::Green(p) => p.name(),
            Self::Aero(p) => p.name(),
            Self::Twilio(p) => p.name(),
        }
    }

    async fn send_sms(
        &self,
        phone: &PhoneNumber,
        text: &str,
        meta: Option<&SendMeta>,
    ) -> Result<DeliveryId, ProviderDeliveryError> {
        match self {
            Self::Telegram(p) => p.send_sms(phone, text, meta).await,
            Self::Green(p) => p.send_sms(phone, text, meta).await,
            Self::Aero(p) => p.send_sms(phone, text, meta).await,
            Self::Twilio(p) => p.send_sms(phone, text, meta).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Telegram(p) => p.health_check().await,
            Self::Green(p) => p.health_check().await,
            Self::Aero(p) => p.health_check().await,
            Self::Twilio(p) => p.health_check().await,
        }
    }
}
