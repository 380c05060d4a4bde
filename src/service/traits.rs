//! Service trait definition.

use super::error::AggregateHealthError;
use crate::types::SendAuthCodeResult;
use std::error::Error as StdError;

/// One-time code delivery as seen by the application.
///
/// Lets request handlers depend on the delivery service without naming its
/// provider and store types.
pub trait AuthCodeService: Send + Sync {
    /// The error type for a failed delivery.
    type Error: StdError + Send + Sync + 'static;

    /// Deliver `code` to `phone`.
    ///
    /// # Returns
    ///
    /// The code and whether the chat gateway carried it.
    fn send_auth_code(
        &self,
        phone: &str,
        code: &str,
    ) -> impl Future<Output = Result<SendAuthCodeResult, Self::Error>> + Send;

    /// Check every channel concurrently. Fails if any of them is unhealthy.
    fn health_check_all(&self) -> impl Future<Output = Result<(), AggregateHealthError>> + Send;
}
