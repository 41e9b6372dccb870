/// JWT Token Signing and Verification
///
/// `TokenSigner` is the capability the token issuer depends on; `JwtSigner`
/// implements it with an HMAC algorithm over one shared secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, ConfigError, TokenError};

/// Signs `{id}` payloads with a lifetime and verifies them back.
///
/// The `_at` methods take the instant explicitly; `sign` and `verify` use the
/// current time.
pub trait TokenSigner: Send + Sync {
    fn sign_at(&self, user_id: &str, ttl: Duration, issued_at: DateTime<Utc>)
        -> Result<String, AppError>;

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;

    fn sign(&self, user_id: &str, ttl: Duration) -> Result<String, AppError> {
        self.sign_at(user_id, ttl, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }
}

pub struct JwtSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtSigner {
    /// Build a signer from validated JWT settings
    ///
    /// # Errors
    /// Returns error if the configured algorithm is not an HMAC one
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigError> {
        let algorithm = config.signing_algorithm()?;
        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        // Expiry is checked against the caller's instant in verify_at.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation
    }
}

impl TokenSigner for JwtSigner {
    fn sign_at(
        &self,
        user_id: &str,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(user_id, issued_at, ttl, self.issuer.clone());

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::BadSignature,
                    ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
