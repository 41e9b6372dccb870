/// Error Handling Module
///
/// Every failure in the service converges into `AppError`:
/// 1. Domain-specific error types (validation, store, auth, token, config)
/// 2. HTTP response mapping with structured context
/// 3. Structured error logging with a per-request id
///
/// Credential failures are deliberately collapsed at the HTTP boundary so a
/// caller cannot tell an unknown email from a wrong password.

use actix_web::{error::ResponseError, http::StatusCode, HttpRequest, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for incoming request data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    InvalidBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be longer ({} characters +)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::InvalidBody(reason) => write!(f, "Invalid request body: {}", reason),
        }
    }
}

impl StdError for ValidationError {}

/// User store errors
#[derive(Debug)]
pub enum StoreError {
    Duplicate(String),
    Unavailable(String),
    Unexpected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "User store unavailable: {}", msg),
            StoreError::Unexpected(msg) => write!(f, "User store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Why a signed token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Missing,
    Malformed,
    BadSignature,
    IssuerMismatch,
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Missing => write!(f, "token missing"),
            TokenError::Malformed => write!(f, "token malformed"),
            TokenError::BadSignature => write!(f, "token signature invalid"),
            TokenError::IssuerMismatch => write!(f, "token issuer mismatch"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl StdError for TokenError {}

/// Authentication errors
///
/// `NotFound` and `InvalidCredential` stay distinct here so logs can tell
/// them apart; the HTTP mapping renders both identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    NotFound,
    InvalidCredential,
    AlreadyExists,
    Unauthorized(TokenError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::InvalidCredential => write!(f, "Invalid password"),
            AuthError::AlreadyExists => write!(f, "User already exists"),
            AuthError::Unauthorized(reason) => write!(f, "Unauthorized: {}", reason),
        }
    }
}

impl StdError for AuthError {}

/// Configuration errors detected after the settings were deserialized
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    /// The authentication error kind, if this is one
    pub fn auth_kind(&self) -> Option<&AuthError> {
        match self {
            AppError::Auth(e) => Some(e),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(e) => match e {
                StoreError::Duplicate(_) => StatusCode::BAD_REQUEST,
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::NotFound | AuthError::InvalidCredential => StatusCode::NOT_FOUND,
                AuthError::AlreadyExists => StatusCode::BAD_REQUEST,
                AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            },
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth(AuthError::Unauthorized(err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            AppError::Store(StoreError::Duplicate("Email already registered".to_string()))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Store(StoreError::Unavailable(error_msg))
        } else {
            AppError::Store(StoreError::Unexpected(error_msg))
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Shared message for unknown-email and wrong-password failures
pub const CREDENTIALS_REJECTED: &str = "Invalid email or password";

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, context: &ErrorContext) -> (StatusCode, ErrorResponse);
    fn log_error(&self, context: &ErrorContext);
}

impl ErrorHandler for AppError {
    fn error_response(&self, context: &ErrorContext) -> (StatusCode, ErrorResponse) {
        let (code, message) = match self {
            AppError::Validation(e) => ("VALIDATION_ERROR", e.to_string()),

            AppError::Store(e) => match e {
                StoreError::Duplicate(_) => ("USER_ALREADY_EXISTS", "User already exists".to_string()),
                StoreError::Unavailable(_) => (
                    "SERVICE_UNAVAILABLE",
                    "User store temporarily unavailable".to_string(),
                ),
                StoreError::Unexpected(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
            },

            AppError::Auth(e) => match e {
                AuthError::NotFound | AuthError::InvalidCredential => {
                    ("NOT_FOUND", CREDENTIALS_REJECTED.to_string())
                }
                AuthError::AlreadyExists => ("USER_ALREADY_EXISTS", "User already exists".to_string()),
                AuthError::Unauthorized(TokenError::Missing) => {
                    ("UNAUTHORIZED", "Authentication token missing".to_string())
                }
                AuthError::Unauthorized(_) => {
                    ("UNAUTHORIZED", "Invalid or expired token".to_string())
                }
            },

            AppError::Config(_) | AppError::Internal(_) => {
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let status = self.status_code();
        let error_response = ErrorResponse::new(
            context.request_id.clone(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, context: &ErrorContext) {
        let request_id = context.request_id.as_str();
        let operation = context.operation.as_str();
        let user_id = context.user_id.as_deref().unwrap_or("-");

        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id, operation, user_id, error = %e, "Validation error");
            }
            AppError::Store(StoreError::Duplicate(_)) => {
                tracing::warn!(request_id, operation, user_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Store(e) => {
                tracing::error!(request_id, operation, user_id, error = %e, "User store error");
            }
            AppError::Auth(e) => match e {
                AuthError::NotFound | AuthError::InvalidCredential => {
                    tracing::warn!(request_id, operation, user_id, error = %e, "Rejected credentials");
                }
                _ => {
                    tracing::warn!(request_id, operation, user_id, error = %e, "Authentication error");
                }
            },
            AppError::Config(e) => {
                tracing::error!(request_id, operation, user_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id, operation, user_id, error = %msg, "Internal error");
            }
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Request-scoped context attached to errors and success logs
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    /// Context carrying the id `LoggerMiddleware` assigned to this request
    pub fn for_request(req: &HttpRequest, operation: impl Into<String>) -> Self {
        let context = Self::new(operation);
        match crate::logger::request_id(req) {
            Some(id) => context.with_request_id(id),
            None => context,
        }
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach this context to a failure
    pub fn reject(&self, error: impl Into<AppError>) -> RequestError {
        RequestError {
            context: self.clone(),
            error: error.into(),
        }
    }
}

/// An `AppError` together with the request it failed in
#[derive(Debug)]
pub struct RequestError {
    pub context: ErrorContext,
    pub error: AppError,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.error, self.context.request_id)
    }
}

impl StdError for RequestError {}

/// Implement ResponseError for Actix-web integration
///
/// The rendered `error_id` is the request id, so it matches `x-request-id`.
impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        self.error.log_error(&self.context);

        let (status, error_response) = self.error.error_response(&self.context);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(err: AppError) -> (StatusCode, ErrorResponse) {
        err.error_response(&ErrorContext::new("test").with_request_id("req-1".to_string()))
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooShort("Password".to_string(), 6);
        assert_eq!(err.to_string(), "Password must be longer (6 characters +)");
    }

    #[test]
    fn test_invalid_body_renders_as_validation_error() {
        let (status, body) = rendered(
            ValidationError::InvalidBody("missing field `password`".to_string()).into(),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(body.message.contains("password"));
    }

    #[test]
    fn test_unknown_email_and_wrong_password_render_identically() {
        let (status_a, body_a) = rendered(AuthError::NotFound.into());
        let (status_b, body_b) = rendered(AuthError::InvalidCredential.into());

        assert_eq!(status_a, status_b);
        assert_eq!(body_a.code, body_b.code);
        assert_eq!(body_a.message, body_b.message);
        assert_eq!(body_a.message, CREDENTIALS_REJECTED);
    }

    #[test]
    fn test_token_errors_render_as_unauthorized() {
        for reason in [TokenError::Missing, TokenError::Expired, TokenError::BadSignature] {
            let err: AppError = reason.into();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            let (_, body) = rendered(err);
            assert_eq!(body.code, "UNAUTHORIZED");
        }
    }

    #[test]
    fn test_missing_token_message_differs_from_rejected_token() {
        let (_, missing) = rendered(TokenError::Missing.into());
        let (_, expired) = rendered(TokenError::Expired.into());
        assert_ne!(missing.message, expired.message);
        assert!(!expired.message.contains("refresh"));
    }

    #[test]
    fn test_duplicate_store_entry_matches_already_exists() {
        let (status_a, body_a) = rendered(StoreError::Duplicate("x".to_string()).into());
        let (status_b, body_b) = rendered(AuthError::AlreadyExists.into());

        assert_eq!(status_a, status_b);
        assert_eq!(body_a.code, body_b.code);
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let (status, body) = rendered(AppError::Internal("secret detail".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("secret detail"));
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("user_login");
        assert_eq!(ctx.operation, "user_login");
        assert!(ctx.user_id.is_none());

        let ctx = ctx
            .with_request_id("abc".to_string())
            .with_user_id("user-123");
        assert_eq!(ctx.request_id, "abc");
        assert_eq!(ctx.user_id, Some("user-123".to_string()));
    }

    #[actix_web::test]
    async fn test_request_error_uses_request_id_as_error_id() {
        let err = ErrorContext::new("user_login")
            .with_request_id("req-42".to_string())
            .reject(AuthError::NotFound);

        let response = ResponseError::error_response(&err);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_id, "req-42");
        assert_eq!(body.code, "NOT_FOUND");
    }
}
