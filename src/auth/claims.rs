/// JWT Claims structure
///
/// Payload carried by both access and refresh tokens. The only
/// application field is `id`; the rest are standard JWT claims (RFC 7519).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User identifier
    pub id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `id`, valid for `ttl` from `issued_at`
    pub fn new(
        id: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: impl Into<String>,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            id: id.into(),
            iat,
            exp: iat + ttl.num_seconds(),
            iss: issuer.into(),
        }
    }

    /// A token stops being valid at its `exp` second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("user-1", at(1_000), Duration::hours(1), "test");

        assert_eq!(claims.id, "user-1");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 4_600);
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims::new("user-1", at(1_000), Duration::seconds(60), "test");

        assert!(!claims.is_expired_at(at(1_000)));
        assert!(!claims.is_expired_at(at(1_059)));
        assert!(claims.is_expired_at(at(1_060)));
        assert!(claims.is_expired_at(at(5_000)));
    }

    #[test]
    fn test_payload_shape() {
        let claims = Claims::new("abc", at(0), Duration::seconds(1), "test");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["id"], "abc");
        assert_eq!(json["exp"], 1);
        assert!(json.get("sub").is_none());
    }
}
