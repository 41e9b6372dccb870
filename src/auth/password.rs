/// Password Hashing and Verification
///
/// Argon2id (memory-hard) with cost parameters from configuration.
/// Hashes are PHC strings, so the salt and parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::configuration::HashingSettings;
use crate::error::{AppError, ConfigError};

#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// # Errors
    /// Returns error if the cost parameters are outside Argon2's bounds
    pub fn new(settings: &HashingSettings) -> Result<Self, ConfigError> {
        let params = Params::new(
            settings.memory_cost,
            settings.time_cost,
            settings.parallelism,
            None,
        )
        .map_err(|e| ConfigError::InvalidValue(format!("hashing parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored PHC hash
    ///
    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash format".to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// `hash` on the blocking pool
    pub async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// `verify` on the blocking pool
    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Argon2Hasher {
    Argon2Hasher::new(&HashingSettings {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    })
    .expect("valid test parameters")
}
