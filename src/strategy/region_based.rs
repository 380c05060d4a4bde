use super::{ProviderSelectionStrategy, SelectionError};
use crate::providers::SmsProvider;
use crate::types::{PhoneNumber, RegionClass};

/// Single-provider selection by region.
///
/// Russian numbers go to the first of `aero`, `green` that is configured;
/// everything else, and Russian numbers with neither configured, goes to
/// `twilio`.
#[derive(Debug, Clone, Default)]
pub struct RegionBasedStrategy;

const RUSSIA_PREFERENCE: [&str; 2] = ["aero", "green"];
const INTERNATIONAL: &str = "twilio";

impl<P: SmsProvider> ProviderSelectionStrategy<P> for RegionBasedStrategy {
    fn select_provider<'a>(&self, phone: &PhoneNumber, providers: &'a [P]) -> Result<&'a P, SelectionError> {
        let by_name = |name: &str| providers.iter().find(|p| p.name() == name);

        if phone.region() == RegionClass::Russia {
            if let Some(provider) = RUSSIA_PREFERENCE.iter().find_map(|&name| by_name(name)) {
                return Ok(provider);
            }
        }

        by_name(INTERNATIONAL).ok_or_else(|| SelectionError::new(phone, providers))
    }
}
