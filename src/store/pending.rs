//! Pending chat-verification requests, keyed by phone.

use super::{KeyValueStore, StoreError};
use crate::types::{PhoneNumber, RequestId};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lifetime of a pending chat request.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(3600);

/// A chat request obtained from an ability check and not yet consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChatRequest {
    pub request_id: RequestId,
    /// Absolute expiry, unix milliseconds.
    pub expires_at: u64,
}

impl PendingChatRequest {
    /// Request expiring `ttl` from now.
    pub fn new(request_id: RequestId, ttl: Duration) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            request_id,
            expires_at: now_millis().saturating_add(ttl_ms),
        }
    }

    /// Live iff `now < expires_at`.
    pub fn is_live(&self) -> bool {
        self.is_live_at(now_millis())
    }

    pub fn is_live_at(&self, now_millis: u64) -> bool {
        now_millis < self.expires_at
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Store of [`PendingChatRequest`]s under `telegram:{phone}`.
#[derive(Debug, Clone)]
pub struct PendingRequestStore<S> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> PendingRequestStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ttl: DEFAULT_PENDING_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    fn key(phone: &PhoneNumber) -> String {
        format!("telegram:{phone}")
    }

    /// Entry for `phone`, if any. Liveness is left to the caller.
    pub async fn get(&self, phone: &PhoneNumber) -> Result<Option<PendingChatRequest>, StoreError> {
        self.store.get_json(&Self::key(phone)).await
    }

    /// Store `request`, overwriting any existing entry.
    pub async fn set(&self, phone: &PhoneNumber, request: &PendingChatRequest) -> Result<(), StoreError> {
        self.store
            .set_json(&Self::key(phone), request, Some(self.ttl))
            .await
    }

    /// Store `request` only if no entry exists. Returns whether it was written.
    pub async fn set_if_absent(
        &self,
        phone: &PhoneNumber,
        request: &PendingChatRequest,
    ) -> Result<bool, StoreError> {
        self.store
            .set_json_if_absent(&Self::key(phone), request, self.ttl)
            .await
    }

    /// Idempotent.
    pub async fn delete(&self, phone: &PhoneNumber) -> Result<(), StoreError> {
        self.store.delete(&Self::key(phone)).await.map(|_| ())
    }
}
