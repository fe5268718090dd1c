//! Repository trait for session tokens.

use crate::domain::entities::ApiToken;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Token storage. Tokens are identified by their HMAC digest, never the raw value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ApiToken, AppError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError>;

    /// Called after successful authentication to track token usage.
    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError>;

    /// Returns `Ok(false)` if the token was unknown or already revoked.
    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Revokes every live token of a user, returning how many were revoked.
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError>;
}
