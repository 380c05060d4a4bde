//! Provider-level error types.

use crate::transport::HttpError;
use thiserror::Error;

/// A single delivery attempt through one provider failed.
///
/// The proxy retries these; the fallback strategy absorbs them and moves on
/// to the next candidate.
#[derive(Debug, Error)]
pub enum ProviderDeliveryError {
    /// Transport failure or non-success HTTP status.
    #[error("{provider}: HTTP call failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: HttpError,
    },

    /// The channel answered but refused the message.
    #[error("{provider} rejected the request: {reason}")]
    Rejected { provider: String, reason: String },

    /// The channel answered with something we cannot interpret.
    #[error("{provider} returned an unexpected response: {reason}")]
    UnexpectedResponse { provider: String, reason: String },

    /// Input was refused before any call was made.
    #[error("{provider}: invalid input: {reason}")]
    InvalidInput { provider: String, reason: String },
}

impl ProviderDeliveryError {
    /// Name of the provider that produced this error.
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Rejected { provider, .. }
            | Self::UnexpectedResponse { provider, .. }
            | Self::InvalidInput { provider, .. } => provider,
        }
    }

    pub(crate) fn transport(provider: &str, source: HttpError) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            source,
        }
    }

    pub(crate) fn rejected(provider: &str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unexpected(provider: &str, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while composing providers. Fatal at setup time, never retried.
#[derive(Debug, Error)]
pub enum ProviderConfigError {
    /// The factory was asked for a name it has no entry for.
    #[error("SMS provider \"{name}\" is not registered")]
    UnknownProvider { name: String },

    /// Required credentials are missing or malformed.
    #[error("invalid configuration for provider \"{provider}\": {reason}")]
    InvalidProviderConfig { provider: String, reason: String },

    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),
}

impl ProviderConfigError {
    pub(crate) fn invalid(provider: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProviderConfig {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}
