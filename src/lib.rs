//! Credential-backed session tokens.
//!
//! Authenticates users by email and password, issues a short-lived access
//! token with a longer-lived refresh token, and reissues both on refresh.

pub mod auth;
pub mod configuration;
pub mod cookies;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod users;
pub mod validators;
