/// Login, register and refresh flows
///
/// Each flow is one stateless request/response step composing the
/// credential validator, the token issuer and the user store.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::credentials::CredentialValidator;
use crate::auth::password::Argon2Hasher;
use crate::auth::tokens::{TokenIssuer, TokenPair};
use crate::error::{AppError, AuthError, StoreError, TokenError};
use crate::users::{Credentials, PublicUser, UserStore};

/// What every successful flow returns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthSession {
    fn new(user: PublicUser, tokens: TokenPair) -> Self {
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    validator: CredentialValidator,
    issuer: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Argon2Hasher, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            validator: CredentialValidator::new(store.clone(), hasher),
            store,
            issuer,
        }
    }

    pub fn issuer(&self) -> Arc<TokenIssuer> {
        self.issuer.clone()
    }

    /// # Errors
    /// `NotFound` or `InvalidCredential`, rendered identically to clients
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AppError> {
        let user = self.validator.validate(credentials).await?.into_public();
        let tokens = self.issuer.issue(&user.id)?;

        Ok(AuthSession::new(user, tokens))
    }

    /// # Errors
    /// - `AlreadyExists` if the email is taken, before any token is issued
    /// - `Internal` if the store accepted the user but cannot return it
    pub async fn register(&self, credentials: &Credentials) -> Result<AuthSession, AppError> {
        if self.store.find_by_email(&credentials.email).await?.is_some() {
            return Err(AuthError::AlreadyExists.into());
        }

        match self.store.create(credentials).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration of the same email.
            Err(AppError::Store(StoreError::Duplicate(_))) => {
                return Err(AuthError::AlreadyExists.into())
            }
            Err(e) => return Err(e),
        }

        let user = self
            .store
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| AppError::Internal("created user could not be fetched".to_string()))?
            .into_public();
        let tokens = self.issuer.issue(&user.id)?;

        Ok(AuthSession::new(user, tokens))
    }

    /// Full reissue of both tokens from a refresh token
    ///
    /// # Errors
    /// - `Unauthorized` if the token is missing or invalid
    /// - `NotFound` if its user no longer exists
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<AuthSession, AppError> {
        let token = refresh_token.ok_or(AuthError::Unauthorized(TokenError::Missing))?;
        let user_id = self.issuer.verify_refresh(token)?;

        let user = self.current_user(&user_id).await?;
        let tokens = self.issuer.issue(&user.id)?;

        Ok(AuthSession::new(user, tokens))
    }

    pub async fn current_user(&self, user_id: &str) -> Result<PublicUser, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(|user| user.into_public())
            .ok_or_else(|| AuthError::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;
    use crate::configuration::JwtSettings;
    use crate::users::{InMemoryUserStore, UserRecord};
    use async_trait::async_trait;

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(
            TokenIssuer::from_settings(&JwtSettings {
                secret: "test-secret-key-at-least-32-characters-long".to_string(),
                access_token_expiry: 3600,
                refresh_token_expiry: 604800,
                issuer: "test".to_string(),
                algorithm: "HS256".to_string(),
            })
            .unwrap(),
        )
    }

    fn service_with(store: Arc<InMemoryUserStore>) -> AuthService {
        AuthService::new(store, test_hasher(), issuer())
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_login_refresh_scenario() {
        let store = Arc::new(InMemoryUserStore::new(test_hasher()));
        let service = service_with(store);
        let issuer = service.issuer();

        let registered = service
            .register(&credentials("a@x.com", "secret1"))
            .await
            .unwrap();
        let id = registered.user.id.clone();
        assert_eq!(issuer.verify_refresh(&registered.refresh_token).unwrap(), id);
        assert_eq!(issuer.verify_access(&registered.access_token).unwrap().id, id);

        let logged_in = service
            .login(&credentials("a@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(logged_in.user, registered.user);
        assert_eq!(issuer.verify_refresh(&logged_in.refresh_token).unwrap(), id);

        let refreshed = service
            .refresh(Some(&logged_in.refresh_token))
            .await
            .unwrap();
        assert_eq!(refreshed.user.id, id);
        assert_eq!(issuer.verify_refresh(&refreshed.refresh_token).unwrap(), id);

        let err = service.refresh(Some("garbage")).await.unwrap_err();
        assert!(matches!(err.auth_kind(), Some(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_duplicate_register_issues_nothing() {
        let store = Arc::new(InMemoryUserStore::new(test_hasher()));
        let service = service_with(store.clone());
        service
            .register(&credentials("a@x.com", "secret1"))
            .await
            .unwrap();

        let err = service
            .register(&credentials("a@x.com", "another1"))
            .await
            .unwrap_err();

        assert_eq!(err.auth_kind(), Some(&AuthError::AlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_both_credential_rejections() {
        let store = Arc::new(InMemoryUserStore::new(test_hasher()));
        let service = service_with(store);
        service
            .register(&credentials("a@x.com", "secret1"))
            .await
            .unwrap();

        let unknown = service
            .login(&credentials("nobody@x.com", "secret1"))
            .await
            .unwrap_err();
        let wrong = service
            .login(&credentials("a@x.com", "wrong-pass"))
            .await
            .unwrap_err();

        assert_eq!(unknown.auth_kind(), Some(&AuthError::NotFound));
        assert_eq!(wrong.auth_kind(), Some(&AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let service = service_with(Arc::new(InMemoryUserStore::new(test_hasher())));

        let err = service.refresh(None).await.unwrap_err();
        assert_eq!(
            err.auth_kind(),
            Some(&AuthError::Unauthorized(TokenError::Missing))
        );
    }

    #[tokio::test]
    async fn test_refresh_for_removed_user() {
        let store = Arc::new(InMemoryUserStore::new(test_hasher()));
        let service = service_with(store.clone());
        let session = service
            .register(&credentials("a@x.com", "secret1"))
            .await
            .unwrap();

        store.remove(&session.user.id).unwrap();

        let err = service
            .refresh(Some(&session.refresh_token))
            .await
            .unwrap_err();
        assert_eq!(err.auth_kind(), Some(&AuthError::NotFound));
    }

    /// Accepts creation but never stores anything.
    struct ForgetfulStore;

    #[async_trait]
    impl UserStore for ForgetfulStore {
        async fn find_by_email(&self, _: &str) -> Result<Option<UserRecord>, AppError> {
            Ok(None)
        }

        async fn find_by_id(&self, _: &str) -> Result<Option<UserRecord>, AppError> {
            Ok(None)
        }

        async fn create(&self, _: &Credentials) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_register_reports_unfetchable_user() {
        let service = AuthService::new(Arc::new(ForgetfulStore), test_hasher(), issuer());

        let err = service
            .register(&credentials("a@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
