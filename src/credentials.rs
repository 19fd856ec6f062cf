use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::AppError;

/// Read and write access to stored password hashes, keyed by email.
///
/// The password reset flow never sees whole user rows; it only needs
/// the current hash and a way to replace it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored password hash for `email`, or `None` when no
    /// account with that address exists.
    async fn find_password_hash(&self, email: &str) -> Result<Option<String>, AppError>;

    /// Replaces the stored password hash for `email`.
    async fn update_password_hash(&self, email: &str, password_hash: &str)
        -> Result<(), AppError>;
}

/// Postgres-backed credential store over the `users` table.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PgCredentialStore { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_password_hash(&self, email: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(hash,)| hash))
    }

    async fn update_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// In-memory credential store for tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    hashes: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account with a pre-computed password hash.
    pub async fn insert(&self, email: &str, password_hash: &str) {
        self.hashes
            .write()
            .await
            .insert(email.to_string(), password_hash.to_string());
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_password_hash(&self, email: &str) -> Result<Option<String>, AppError> {
        Ok(self.hashes.read().await.get(email).cloned())
    }

    async fn update_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        self.hashes
            .write()
            .await
            .insert(email.to_string(), password_hash.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_memory_store_find_and_update() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.find_password_hash("a@example.com").await.unwrap(), None);

        store.insert("a@example.com", "hash-one").await;
        assert_eq!(
            store.find_password_hash("a@example.com").await.unwrap(),
            Some("hash-one".to_string())
        );

        store
            .update_password_hash("a@example.com", "hash-two")
            .await
            .unwrap();
        assert_eq!(
            store.find_password_hash("a@example.com").await.unwrap(),
            Some("hash-two".to_string())
        );
    }
}
