use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::otp::OtpRecord;

/// Keyed storage for live OTP records, one record per email.
///
/// `set` replaces any existing record for the address. The coordinator
/// treats the store as a dumb key-value map; all lifecycle rules live in
/// the coordinator itself, so alternative backends (Redis, a table) only
/// need these four calls.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<OtpRecord>, AppError>;
    async fn set(&self, email: &str, record: OtpRecord) -> Result<(), AppError>;
    async fn delete(&self, email: &str) -> Result<(), AppError>;
    /// Drops every record issued more than `ttl_minutes` ago.
    async fn cleanup_expired(&self, ttl_minutes: i64) -> Result<(), AppError>;
}

/// Process-local store backed by a `HashMap`.
///
/// Records do not survive a restart and are not shared across instances,
/// which matches the single-process deployment this service targets.
#[derive(Default)]
pub struct MemoryOtpStore {
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn get(&self, email: &str) -> Result<Option<OtpRecord>, AppError> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn set(&self, email: &str, record: OtpRecord) -> Result<(), AppError> {
        self.records.write().await.insert(email.to_string(), record);
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), AppError> {
        self.records.write().await.remove(email);
        Ok(())
    }

    async fn cleanup_expired(&self, ttl_minutes: i64) -> Result<(), AppError> {
        let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
        self.records
            .write()
            .await
            .retain(|_, record| record.issued_at >= cutoff);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_set_get_delete_roundtrip() {
        let store = MemoryOtpStore::new();
        assert!(store.get("a@example.com").await.unwrap().is_none());

        let record = OtpRecord::new("123456".to_string());
        store.set("a@example.com", record.clone()).await.unwrap();
        assert_eq!(store.get("a@example.com").await.unwrap(), Some(record));

        store.delete("a@example.com").await.unwrap();
        assert!(store.get("a@example.com").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_set_replaces_existing_record() {
        let store = MemoryOtpStore::new();
        store
            .set("a@example.com", OtpRecord::new("111111".to_string()))
            .await
            .unwrap();
        store
            .set("a@example.com", OtpRecord::new("222222".to_string()))
            .await
            .unwrap();

        let record = store.get("a@example.com").await.unwrap().unwrap();
        assert_eq!(record.code, "222222");
    }

    #[actix_rt::test]
    async fn test_cleanup_expired_drops_only_stale_records() {
        let store = MemoryOtpStore::new();

        let mut stale = OtpRecord::new("111111".to_string());
        stale.issued_at = Utc::now() - Duration::minutes(11);
        store.set("stale@example.com", stale).await.unwrap();

        store
            .set("fresh@example.com", OtpRecord::new("222222".to_string()))
            .await
            .unwrap();

        store.cleanup_expired(10).await.unwrap();

        assert!(store.get("stale@example.com").await.unwrap().is_none());
        assert!(store.get("fresh@example.com").await.unwrap().is_some());
    }
}
