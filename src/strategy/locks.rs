use crate::types::PhoneNumber;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process mutual exclusion per phone number.
///
/// Idle entries are pruned whenever a new lock is taken.
#[derive(Debug, Default, Clone)]
pub struct PhoneLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PhoneLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `phone`. Released when the guard drops.
    pub async fn lock(&self, phone: &PhoneNumber) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(phone.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of phones currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_phone_is_exclusive() {
        let locks = PhoneLocks::new();
        let phone = PhoneNumber::new("+79998887766").unwrap();

        let guard = locks.lock(&phone).await;
        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.lock(&phone)).await;
        assert!(waiting.is_err());

        drop(guard);
        let again = tokio::time::timeout(Duration::from_millis(20), locks.lock(&phone)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_phones_do_not_block() {
        let locks = PhoneLocks::new();
        let _a = locks.lock(&PhoneNumber::new("+79998887766").unwrap()).await;
        let b = tokio::time::timeout(
            Duration::from_millis(20),
            locks.lock(&PhoneNumber::new("+14155550123").unwrap()),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = PhoneLocks::new();
        drop(locks.lock(&PhoneNumber::new("+79998887766").unwrap()).await);
        let _held = locks.lock(&PhoneNumber::new("+14155550123").unwrap()).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
