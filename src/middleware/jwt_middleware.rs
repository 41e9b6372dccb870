/// Bearer Token Middleware
///
/// Verifies the access token from the Authorization header and injects its
/// claims into request extensions for protected handlers.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::error::{AuthError, ErrorContext, TokenError};

pub struct JwtMiddleware {
    issuer: Arc<TokenIssuer>,
}

impl JwtMiddleware {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: Arc<TokenIssuer>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Answers with the 401 error body directly; an `Err` would skip the outer
/// middleware's response handling.
fn reject<B>(req: ServiceRequest, reason: AuthError) -> ServiceResponse<EitherBody<B>> {
    let error = ErrorContext::for_request(req.request(), "access_token").reject(reason);
    req.error_response(error).map_into_right_body()
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match bearer_token(&req) {
            Some(token) => self.issuer.verify_access(&token),
            None => Err(AuthError::Unauthorized(TokenError::Missing)),
        };

        match claims {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.id, "Access token validated");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(reason) => {
                tracing::warn!("Access token rejected: {}", reason);
                Box::pin(async move { Ok(reject(req, reason)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::logger::LoggerMiddleware;
    use actix_web::{test, web, App, HttpResponse};
    use serde_json::Value;

    fn issuer() -> Arc<TokenIssuer> {
        let settings = JwtSettings {
            secret: "middleware-secret-key-at-least-32-chars".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
            algorithm: "HS256".to_string(),
        };
        Arc::new(TokenIssuer::from_settings(&settings).unwrap())
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_rejection_uses_error_body_and_keeps_request_id() {
        let app = test::init_service(
            App::new().wrap(LoggerMiddleware).service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(issuer()))
                    .route(web::get().to(ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
        let request_id = res
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["error_id"], request_id.as_str());
    }

    #[actix_web::test]
    async fn test_missing_header_is_rejected() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(issuer()))
                    .route(web::get().to(ok)),
            ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;

        assert_eq!(res.status().as_u16(), 401);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Authentication token missing");
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let issuer = issuer();
        let tokens = issuer.issue("user-1").unwrap();
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(issuer))
                    .route(web::get().to(ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", tokens.access_token)))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 200);
    }
}
