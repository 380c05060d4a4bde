//! Telegram Gateway provider.
//!
//! The gateway both gates and delivers verification codes: an ability check
//! reserves a `request_id` for a phone, and the send call delivers the code
//! under that request.
//!
//! # Example
//!
//! ```rust,ignore
//! use otp_gateway::providers::telegram::{TelegramGateway, TelegramProvider};
//! use otp_gateway::{ChatGateway, PhoneNumber};
//!
//! let client = TelegramGateway::builder("gateway_token").build()?;
//! let provider = TelegramProvider::new(client);
//!
//! let phone = PhoneNumber::new("+79991234567")?;
//! let ability = provider.check_send_ability(&phone).await?;
//! ```

pub mod client;
pub mod provider;
pub mod types;

pub use client::{DEFAULT_API_URL, TelegramGateway, TelegramGatewayBuilder};
pub use provider::TelegramProvider;
