//! Provider selection strategies.

mod fallback_order;
mod locks;
mod region_based;
mod telegram_fallback;

pub use fallback_order::FallbackOrder;
pub use locks::PhoneLocks;
pub use region_based::RegionBasedStrategy;
pub use telegram_fallback::{ChatChannelError, DEFAULT_MESSAGE_TEMPLATE, TelegramFallbackStrategy};

use crate::providers::SmsProvider;
use crate::types::{PhoneNumber, RegionClass};
use thiserror::Error;

/// No candidate matches the phone's region.
///
/// A setup problem (the required provider was never configured), not a
/// runtime fault worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no provider for {region} numbers among [{}]", .candidates.join(", "))]
pub struct SelectionError {
    pub region: RegionClass,
    pub candidates: Vec<String>,
}

impl SelectionError {
    pub(crate) fn new<P: SmsProvider>(phone: &PhoneNumber, providers: &[P]) -> Self {
        Self {
            region: phone.region(),
            candidates: providers.iter().map(|p| p.name().to_string()).collect(),
        }
    }
}

/// Picks the provider that should serve a phone.
pub trait ProviderSelectionStrategy<P: SmsProvider> {
    fn select_provider<'a>(&self, phone: &PhoneNumber, providers: &'a [P]) -> Result<&'a P, SelectionError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::errors::ProviderDeliveryError;
    use crate::providers::{SendMeta, SmsProvider};
    use crate::types::{DeliveryId, PhoneNumber};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Provider with a fixed outcome that counts its sends and keeps their texts.
    #[derive(Debug, Clone)]
    pub struct StubProvider {
        pub name: &'static str,
        pub fails: bool,
        pub healthy: bool,
        pub sends: Arc<AtomicUsize>,
        pub texts: Arc<Mutex<Vec<String>>>,
    }

    impl StubProvider {
        pub fn ok(name: &'static str) -> Self {
            Self {
                name,
                fails: false,
                healthy: true,
                sends: Arc::new(AtomicUsize::new(0)),
                texts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing(name: &'static str) -> Self {
            Self {
                fails: true,
                ..Self::ok(name)
            }
        }

        pub fn sends(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }

        pub fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }
    }

    impl SmsProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn send_sms(
            &self,
            _phone: &PhoneNumber,
            text: &str,
            _meta: Option<&SendMeta>,
        ) -> Result<DeliveryId, ProviderDeliveryError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.texts.lock().unwrap().push(text.to_string());
            if self.fails {
                Err(ProviderDeliveryError::rejected(self.name, "stub failure"))
            } else {
                Ok(DeliveryId::new(format!("{}-1", self.name)))
            }
        }

        async fn health_check(&self) -> bool {
            self.healthy
        }
    }
}
