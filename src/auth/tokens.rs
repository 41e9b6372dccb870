/// Token issuance
///
/// Issues matched access/refresh pairs and verifies tokens handed back by
/// clients. There is no revocation store: a token stays valid until `exp`.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::auth::claims::Claims;
use crate::auth::jwt::{JwtSigner, TokenSigner};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Access and refresh token issued together for one user at one instant
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            signer,
            access_ttl,
            refresh_ttl,
        }
    }

    /// JWT-backed issuer with expiries from settings
    pub fn from_settings(config: &JwtSettings) -> Result<Self, AppError> {
        let signer = JwtSigner::new(config)?;
        Ok(Self::new(
            Arc::new(signer),
            config.access_ttl(),
            config.refresh_ttl(),
        ))
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue(&self, user_id: &str) -> Result<TokenPair, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.signer.sign_at(user_id, self.access_ttl, now)?,
            refresh_token: self.signer.sign_at(user_id, self.refresh_ttl, now)?,
        })
    }

    /// Decode the user id from a refresh token
    ///
    /// # Errors
    /// `AuthError::Unauthorized` if the token is malformed, forged or expired
    pub fn verify_refresh(&self, token: &str) -> Result<String, AuthError> {
        self.verify_refresh_at(token, Utc::now())
    }

    pub fn verify_refresh_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.signer
            .verify_at(token, now)
            .map(|claims| claims.id)
            .map_err(AuthError::Unauthorized)
    }

    /// Decode the claims of an access token presented as a bearer credential
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token).map_err(AuthError::Unauthorized)
    }
}
