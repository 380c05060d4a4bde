//! Verification codes, keyed by phone.

use super::{KeyValueStore, StoreError};
use crate::types::{AuthCode, PhoneNumber};
use std::time::Duration;

/// Default code lifetime.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(300);

/// Stores the last code issued to a phone under `code:{phone}`.
///
/// Plain storage only: whether a code is single-use is up to the caller.
#[derive(Debug, Clone)]
pub struct VerificationCodeStore<S> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> VerificationCodeStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ttl: DEFAULT_CODE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(phone: &PhoneNumber) -> String {
        format!("code:{phone}")
    }

    pub async fn save(&self, phone: &PhoneNumber, code: &AuthCode) -> Result<(), StoreError> {
        self.store.set_json(&Self::key(phone), code, Some(self.ttl)).await
    }

    pub async fn get(&self, phone: &PhoneNumber) -> Result<Option<AuthCode>, StoreError> {
        self.store.get_json(&Self::key(phone)).await
    }

    pub async fn delete(&self, phone: &PhoneNumber) -> Result<(), StoreError> {
        self.store.delete(&Self::key(phone)).await.map(|_| ())
    }
}
