/// Refresh token cookie
///
/// `refreshToken=<jwt>; HttpOnly; Secure; SameSite=None; Domain=<domain>; Path=/`
/// The cookie expires together with the refresh token it carries.

use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::configuration::{CookieSettings, JwtSettings};

#[derive(Clone, Debug)]
pub struct RefreshCookie {
    name: String,
    domain: String,
    lifetime_seconds: i64,
}

impl RefreshCookie {
    pub fn new(cookie: &CookieSettings, jwt: &JwtSettings) -> Self {
        Self {
            name: cookie.name.clone(),
            domain: cookie.domain.clone(),
            lifetime_seconds: jwt.refresh_token_expiry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie carrying `token`, expiring `now + refresh lifetime`
    pub fn issue(&self, token: &str) -> Cookie<'static> {
        self.build(
            token.to_string(),
            OffsetDateTime::now_utc() + Duration::seconds(self.lifetime_seconds),
        )
    }

    /// Same cookie, emptied and expired at the Unix epoch
    pub fn clear(&self) -> Cookie<'static> {
        self.build(String::new(), OffsetDateTime::UNIX_EPOCH)
    }

    /// Refresh token sent by the client, if any
    pub fn extract(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(&self.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    fn build(&self, value: String, expires: OffsetDateTime) -> Cookie<'static> {
        Cookie::build(self.name.clone(), value)
            .domain(self.domain.clone())
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .expires(expires)
            .finish()
    }
}
