/// Input validators for login and registration payloads
///
/// - Email: length limits, RFC 5322 simplified format, suspicious patterns
/// - Password: at least 6 characters, bounded above to cap hashing cost

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::users::Credentials;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 1024;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address.
///
/// Case is preserved: stored emails are matched case-sensitively. Surrounding
/// whitespace is rejected, not stripped.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() != email.len() {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a plaintext password. Not trimmed: spaces are significant.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyField("Password".to_string()));
    }

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("Password".to_string(), MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("Password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validates a login/register payload
pub fn validate_credentials(credentials: Credentials) -> Result<Credentials, ValidationError> {
    let email = is_valid_email(&credentials.email)?;
    is_valid_password(&credentials.password)?;

    Ok(Credentials {
        email,
        password: credentials.password,
    })
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    // Local part over 64 characters (RFC 5321)
    if let Some(at_pos) = email.find('@') {
        if at_pos > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}
