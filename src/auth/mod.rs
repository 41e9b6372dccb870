/// Authentication module
///
/// Handles credential validation, Argon2 password hashing, JWT signing and
/// the login/register/refresh flows built on top of them.

mod claims;
mod credentials;
mod jwt;
pub(crate) mod password;
mod service;
mod tokens;

pub use claims::Claims;
pub use credentials::CredentialValidator;
pub use jwt::{JwtSigner, TokenSigner};
pub use password::Argon2Hasher;
pub use service::{AuthService, AuthSession};
pub use tokens::{TokenIssuer, TokenPair};
