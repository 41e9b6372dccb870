use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored user, including the password hash.
///
/// Not serializable: responses carry `PublicUser` only.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Drop the password hash
    pub fn into_public(self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Password-free view of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// Email and plaintext password, as submitted to login or register
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_drops_password_hash() {
        let record = UserRecord {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&record.into_public()).unwrap();
        assert!(json.contains("\"id\":\"u1\""));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("argon2"));
        assert!(!json.to_lowercase().contains("password"));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials {
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        };
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains("secret1"));
    }
}
