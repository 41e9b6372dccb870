/// Authentication Routes
///
/// Registration, login, token refresh, logout and current user lookup.
/// Successful flows return `{user, accessToken, refreshToken}` and set the
/// refresh token cookie.

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::{AuthService, AuthSession, Claims};
use crate::cookies::RefreshCookie;
use crate::error::{ErrorContext, RequestError};
use crate::users::Credentials;
use crate::validators::validate_credentials;

fn log_success(context: &ErrorContext, message: &str) {
    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = context.user_id.as_deref().unwrap_or("-"),
        "{}",
        message
    );
}

fn session_response(
    mut builder: actix_web::HttpResponseBuilder,
    session: AuthSession,
    cookie: &RefreshCookie,
) -> HttpResponse {
    builder
        .cookie(cookie.issue(&session.refresh_token))
        .json(session)
}

/// POST /auth/register
///
/// # Errors
/// - 400: Validation error or email already registered
/// - 500: Created user could not be read back
pub async fn register(
    req: HttpRequest,
    form: web::Json<Credentials>,
    service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::for_request(&req, "user_registration");

    let credentials = validate_credentials(form.into_inner()).map_err(|e| context.reject(e))?;
    let session = service
        .register(&credentials)
        .await
        .map_err(|e| context.reject(e))?;

    log_success(&context.with_user_id(session.user.id.as_str()), "User registered successfully");

    Ok(session_response(HttpResponse::Created(), session, &cookie))
}

/// POST /auth/login
///
/// # Errors
/// - 400: Validation error
/// - 404: Unknown email or wrong password (one response for both)
pub async fn login(
    req: HttpRequest,
    form: web::Json<Credentials>,
    service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::for_request(&req, "user_login");

    let credentials = validate_credentials(form.into_inner()).map_err(|e| context.reject(e))?;
    let session = service
        .login(&credentials)
        .await
        .map_err(|e| context.reject(e))?;

    log_success(&context.with_user_id(session.user.id.as_str()), "User logged in successfully");

    Ok(session_response(HttpResponse::Ok(), session, &cookie))
}

/// POST /auth/login/access-token
///
/// Reissues both tokens from the refresh token cookie.
///
/// # Errors
/// - 401: Cookie missing, or token malformed, forged or expired
/// - 404: The token's user no longer exists
pub async fn refresh(
    req: HttpRequest,
    service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::for_request(&req, "token_refresh");

    let token = cookie.extract(&req);
    let session = service
        .refresh(token.as_deref())
        .await
        .map_err(|e| context.reject(e))?;

    log_success(&context.with_user_id(session.user.id.as_str()), "Token refreshed successfully");

    Ok(session_response(HttpResponse::Ok(), session, &cookie))
}

/// POST /auth/logout
///
/// Clears the refresh token cookie. Tokens already issued stay valid until
/// they expire.
pub async fn logout(cookie: web::Data<RefreshCookie>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookie.clear())
        .json(serde_json::json!({ "success": true }))
}

/// GET /auth/me
///
/// Requires `Authorization: Bearer <access_token>`; claims are injected by
/// the JWT middleware.
pub async fn get_current_user(
    req: HttpRequest,
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::for_request(&req, "current_user").with_user_id(claims.id.as_str());

    let user = service
        .current_user(&claims.id)
        .await
        .map_err(|e| context.reject(e))?;

    Ok(HttpResponse::Ok().json(user))
}
