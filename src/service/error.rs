//! Service-level error types.

use crate::errors::ProviderDeliveryError;
use crate::strategy::SelectionError;
use crate::types::{PhoneNumber, ValidationError};
use crate::utils::phone::mask_phone;
use thiserror::Error;

/// Caller-visible failure of a code delivery.
///
/// Provider and chat errors never escape on their own; they are logged and
/// turned into "try the next option". Only exhaustion surfaces here.
#[derive(Debug, Error)]
pub enum SendAuthCodeError {
    /// Phone or code input is malformed. No provider was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The chat channel and every regional carrier for the phone failed.
    #[error("All fallback providers failed for {}", mask_phone(.phone.as_str()))]
    AllProvidersFailed {
        phone: PhoneNumber,
        /// Providers tried, in order. Empty when none of the region's
        /// carriers is configured.
        attempted: Vec<String>,
    },
}

/// One or more providers reported unhealthy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unhealthy providers: {}", .unhealthy.join(", "))]
pub struct AggregateHealthError {
    pub unhealthy: Vec<String>,
}

/// Failure of the single-provider [`send_sms`](super::SmsFacade::send_sms) path.
#[derive(Debug, Error)]
pub enum SendSmsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NoProvider(#[from] SelectionError),

    #[error(transparent)]
    Delivery(#[from] ProviderDeliveryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_failed_masks_phone() {
        let err = SendAuthCodeError::AllProvidersFailed {
            phone: PhoneNumber::new("+14155550123").unwrap(),
            attempted: vec!["twilio".to_string()],
        };
        let message = err.to_string();
        assert!(message.starts_with("All fallback providers failed for"));
        assert!(!message.contains("4155550123"));
    }

    #[test]
    fn test_aggregate_lists_names() {
        let err = AggregateHealthError {
            unhealthy: vec!["green".to_string(), "telegram".to_string()],
        };
        assert_eq!(err.to_string(), "Unhealthy providers: green, telegram");
    }
}
