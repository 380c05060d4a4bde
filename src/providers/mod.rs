//! Delivery channel implementations.

pub mod any;
pub mod green_sms;
pub mod proxy;
pub mod sms_aero;
pub mod telegram;
pub(crate) mod traits;
pub mod twilio;

pub use any::AnyProvider;
pub use green_sms::GreenSmsProvider;
pub use proxy::{HealthCache, SmsProviderProxy};
pub use sms_aero::SmsAeroProvider;
pub use telegram::{TelegramGateway, TelegramProvider};
pub use traits::{ChatGateway, SendAbility, SendMeta, SmsProvider};
pub use twilio::TwilioProvider;
