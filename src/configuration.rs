use config::ConfigError;
use jsonwebtoken::Algorithm;

use crate::error::ConfigError as SettingsError;

const MIN_SECRET_LENGTH: usize = 32;
const MAX_TOKEN_EXPIRY: i64 = 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    /// Absent means the process keeps users in memory.
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
    #[serde(default)]
    pub hashing: HashingSettings,
}

impl Settings {
    /// Checks the values serde cannot: secret strength and signing algorithm.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.jwt.validate()?;
        if self.cookie.domain.trim().is_empty() {
            return Err(SettingsError::MissingRequired("cookie.domain".to_string()));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings shared by access and refresh tokens
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: i64, // seconds (3600 = 1 hour)
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: i64, // seconds (604800 = 7 days), also the cookie lifetime
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl JwtSettings {
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_expiry)
    }

    /// Only HMAC algorithms apply: one shared secret signs and verifies.
    pub fn signing_algorithm(&self) -> Result<Algorithm, SettingsError> {
        match self.algorithm.as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(SettingsError::InvalidValue(format!(
                "jwt.algorithm must be HS256, HS384 or HS512, got {}",
                other
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(SettingsError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        for (name, expiry) in [
            ("jwt.access_token_expiry", self.access_token_expiry),
            ("jwt.refresh_token_expiry", self.refresh_token_expiry),
        ] {
            if expiry <= 0 || expiry > MAX_TOKEN_EXPIRY {
                return Err(SettingsError::InvalidValue(format!(
                    "{} must be between 1 and {} seconds",
                    name, MAX_TOKEN_EXPIRY
                )));
            }
        }
        self.signing_algorithm()?;
        Ok(())
    }
}

/// Refresh token cookie attributes
#[derive(serde::Deserialize, Clone)]
pub struct CookieSettings {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_domain")]
    pub domain: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            domain: default_cookie_domain(),
        }
    }
}

/// Argon2id cost parameters
#[derive(serde::Deserialize, Clone, Debug)]
pub struct HashingSettings {
    pub memory_cost: u32, // KiB
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            memory_cost: argon2::Params::DEFAULT_M_COST,
            time_cost: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_access_expiry() -> i64 {
    60 * 60
}

fn default_refresh_expiry() -> i64 {
    7 * 24 * 60 * 60
}

fn default_issuer() -> String {
    "session_tokens".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_cookie_name() -> String {
    "refreshToken".to_string()
}

fn default_cookie_domain() -> String {
    "localhost".to_string()
}

/// Reads `configuration.{yaml,toml,json}` from the working directory, then
/// `APP_`-prefixed environment variables (`APP_JWT__SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
