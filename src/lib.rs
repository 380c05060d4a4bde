//! # OTP Gateway
//!
//! One-time code delivery over a chat verification gateway with regional SMS
//! fallback.
//!
//! A code is first offered to the Telegram gateway. When the gateway refuses
//! the phone or fails, the code goes out as a plain SMS through the carriers
//! configured for the phone's region, tried once each in a fixed order.
//!
//! ## Supported Providers
//!
//! | Name | Provider | Role |
//! |------|----------|------|
//! | `telegram` | Telegram Gateway | chat channel, tried first |
//! | `green` | GreenSMS | Russian numbers |
//! | `aero` | SMS Aero | Russian numbers |
//! | `twilio` | Twilio | international numbers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use otp_gateway::{ProviderRegistry, SmsFacade, SmsFacadeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // SMS_PROVIDER__TELEGRAM__TOKEN=..., SMS_PROVIDER__GREEN__USER=..., etc.
//!     let registry = ProviderRegistry::from_env();
//!
//!     let config = SmsFacadeConfig::builder().retries(2).build();
//!     let store = config.redis_store("redis://localhost:6379").await?;
//!     let facade = SmsFacade::from_registry(registry, store, config)?;
//!
//!     let result = facade.send_auth_code("+79991234567", "4821").await?;
//!     println!("Delivered via telegram: {}", result.telegram_way);
//!
//!     facade.health_check_all().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SmsFacade
//!     │
//!     ▼
//! TelegramFallbackStrategy ──► PendingRequestStore ──► KeyValueStore (Memory | Redis)
//!     │
//!     ▼
//! SmsProviderProxy<P>   (retry + shared health cache)
//!     │
//!     ▼
//! SmsProvider / ChatGateway  (TelegramProvider, GreenSmsProvider, SmsAeroProvider, TwilioProvider)
//! ```
//!
//! ## Features
//!
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)
//! - `redis-store` - Redis-backed [`KeyValueStore`] (enabled by default)

pub mod errors;
pub mod factory;
pub mod providers;
pub mod service;
pub mod store;
pub mod strategy;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use errors::{ProviderConfigError, ProviderDeliveryError};
pub use factory::{ProviderFactory, ProviderRegistry};
pub use providers::{
    AnyProvider, ChatGateway, GreenSmsProvider, HealthCache, SendAbility, SendMeta, SmsAeroProvider, SmsProvider,
    SmsProviderProxy, TelegramProvider, TwilioProvider,
};
pub use service::{
    AggregateHealthError, AuthCodeService, SendAuthCodeError, SendSmsError, SmsFacade, SmsFacadeConfig,
    SmsFacadeConfigBuilder,
};
#[cfg(feature = "redis-store")]
pub use store::RedisStore;
pub use store::{KeyValueStore, MemoryStore, PendingRequestStore, StoreError, VerificationCodeStore};
pub use strategy::{
    FallbackOrder, PhoneLocks, ProviderSelectionStrategy, RegionBasedStrategy, SelectionError,
    TelegramFallbackStrategy,
};
pub use types::{AuthCode, DeliveryId, PhoneNumber, RegionClass, RequestId, SendAuthCodeResult, ValidationError};
pub use utils::retry::RetryConfig;
