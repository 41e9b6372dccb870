/// Credential validation
///
/// Looks a user up by email and checks the password against the stored
/// Argon2 hash.

use std::sync::Arc;

use crate::auth::password::Argon2Hasher;
use crate::error::{AppError, AuthError};
use crate::users::{Credentials, UserRecord, UserStore};

#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn UserStore>,
    hasher: Argon2Hasher,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn UserStore>, hasher: Argon2Hasher) -> Self {
        Self { store, hasher }
    }

    /// # Errors
    /// - `AuthError::NotFound` when no user has this email
    /// - `AuthError::InvalidCredential` when the password does not match
    pub async fn validate(&self, credentials: &Credentials) -> Result<UserRecord, AppError> {
        let user = self
            .store
            .find_by_email(&credentials.email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let matches = match self
            .hasher
            .verify_blocking(credentials.password.clone(), user.password_hash.clone())
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                // An unreadable stored hash must not surface as its own error kind.
                tracing::error!(user_id = %user.id, error = %e, "Stored password hash unusable");
                false
            }
        };

        if !matches {
            return Err(AuthError::InvalidCredential.into());
        }

        Ok(user)
    }
}
