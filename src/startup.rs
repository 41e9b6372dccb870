use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{Argon2Hasher, AuthService, TokenIssuer};
use crate::configuration::Settings;
use crate::cookies::RefreshCookie;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::users::{InMemoryUserStore, PgUserStore, UserStore};

/// Everything the HTTP layer needs, built once from settings
#[derive(Clone)]
pub struct Application {
    pub service: AuthService,
    pub refresh_cookie: RefreshCookie,
}

impl Application {
    /// Validate settings and wire the store, hasher and issuer together.
    ///
    /// Uses Postgres when `database` is configured, otherwise keeps users in
    /// memory.
    pub async fn build(settings: &Settings) -> Result<Self, AppError> {
        settings.validate()?;

        let hasher = Argon2Hasher::new(&settings.hashing)?;
        let store: Arc<dyn UserStore> = match &settings.database {
            Some(database) => {
                tracing::info!("Connecting to user database");
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database.connection_string())
                    .await?;
                Arc::new(PgUserStore::new(pool, hasher.clone()))
            }
            None => {
                tracing::warn!("No database configured, users are kept in memory");
                Arc::new(InMemoryUserStore::new(hasher.clone()))
            }
        };

        Self::with_store(settings, store, hasher)
    }

    /// Wire an application around an existing store
    pub fn with_store(
        settings: &Settings,
        store: Arc<dyn UserStore>,
        hasher: Argon2Hasher,
    ) -> Result<Self, AppError> {
        let issuer = Arc::new(TokenIssuer::from_settings(&settings.jwt)?);

        Ok(Self {
            service: AuthService::new(store, hasher, issuer),
            refresh_cookie: RefreshCookie::new(&settings.cookie, &settings.jwt),
        })
    }
}

/// Malformed or incomplete JSON bodies render as validation errors
fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    ErrorContext::for_request(req, "parse_body")
        .reject(ValidationError::InvalidBody(err.to_string()))
        .into()
}

pub fn run(listener: TcpListener, application: Application) -> Result<Server, std::io::Error> {
    let issuer = application.service.issuer();
    let service = web::Data::new(application.service);
    let refresh_cookie = web::Data::new(application.refresh_cookie);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(service.clone())
            .app_data(refresh_cookie.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/login/access-token", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))

            // Protected routes (require a bearer access token)
            .service(
                web::resource("/auth/me")
                    .wrap(JwtMiddleware::new(issuer.clone()))
                    .route(web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
