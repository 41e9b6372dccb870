/// User Store
///
/// The persistence collaborator: lookups by email or id, and creation from
/// credentials. Creation hashes the password; callers never see plaintext
/// reach storage.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::auth::Argon2Hasher;
use crate::error::{AppError, StoreError};
use crate::users::model::{Credentials, UserRecord};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError>;

    /// Hash the password and persist a new user.
    ///
    /// Fails with `StoreError::Duplicate` if the email is taken.
    async fn create(&self, credentials: &Credentials) -> Result<(), AppError>;
}

#[derive(Default)]
struct Users {
    by_id: HashMap<String, UserRecord>,
    id_by_email: HashMap<String, String>,
}

/// Process-local store, used when no database is configured
pub struct InMemoryUserStore {
    hasher: Argon2Hasher,
    users: RwLock<Users>,
}

impl InMemoryUserStore {
    pub fn new(hasher: Argon2Hasher) -> Self {
        Self {
            hasher,
            users: RwLock::new(Users::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a user, as an external admin action would
    pub fn remove(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let removed = users.by_id.remove(id);
        if let Some(user) = &removed {
            users.id_by_email.remove(&user.email);
        }
        Ok(removed)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Store(StoreError::Unexpected("user table lock poisoned".to_string()))
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .id_by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.by_id.get(id).cloned())
    }

    async fn create(&self, credentials: &Credentials) -> Result<(), AppError> {
        let password_hash = self
            .hasher
            .hash_blocking(credentials.password.clone())
            .await?;

        let mut users = self.users.write().map_err(poisoned)?;
        if users.id_by_email.contains_key(&credentials.email) {
            return Err(StoreError::Duplicate("Email already registered".to_string()).into());
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: credentials.email.clone(),
            password_hash,
            created_at: Utc::now(),
        };
        users
            .id_by_email
            .insert(record.email.clone(), record.id.clone());
        users.by_id.insert(record.id.clone(), record);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;

    fn credentials(email: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = InMemoryUserStore::new(test_hasher());
        store.create(&credentials("a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(&by_email.id).await.unwrap().unwrap();

        assert_eq!(by_email.id, by_id.id);
        assert!(by_email.password_hash.starts_with("$argon2id$"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryUserStore::new(test_hasher());
        store.create(&credentials("a@x.com")).await.unwrap();

        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new(test_hasher());
        store.create(&credentials("a@x.com")).await.unwrap();

        let result = store.create(&credentials("a@x.com")).await;
        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::Duplicate(_)))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryUserStore::new(test_hasher());
        store.create(&credentials("a@x.com")).await.unwrap();
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();

        store.remove(&user.id).unwrap();

        assert!(store.find_by_id(&user.id).await.unwrap().is_none());
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
