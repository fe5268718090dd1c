//! Session token issued at login.

use chrono::{DateTime, Utc};

/// Stored API token. Only the HMAC digest of the raw token is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    /// Returns true when the token is neither revoked nor expired.
    pub fn is_usable(&self) -> bool {
        self.revoked_at.is_none() && Utc::now() < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration, revoked: bool) -> ApiToken {
        ApiToken {
            id: 1,
            user_id: 1,
            token_hash: "h".to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + expires_in,
            last_used_at: None,
            revoked_at: revoked.then(Utc::now),
        }
    }

    #[test]
    fn test_usable_token() {
        assert!(token(Duration::hours(1), false).is_usable());
    }

    #[test]
    fn test_expired_token() {
        assert!(!token(Duration::seconds(-1), false).is_usable());
    }

    #[test]
    fn test_revoked_token() {
        assert!(!token(Duration::hours(1), true).is_usable());
    }
}
