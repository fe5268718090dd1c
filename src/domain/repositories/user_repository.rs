//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, UpdateUser, User};
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Stored password digest (`salt$hex`) for a user.
    async fn find_password_hash(&self, user_id: i64) -> Result<Option<String>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email already exists.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn update(&self, id: i64, user: UpdateUser) -> Result<Option<User>, AppError>;

    /// Replaces the set of stations assigned to a user.
    async fn set_assigned_stations(
        &self,
        id: i64,
        station_ids: Vec<i64>,
    ) -> Result<Option<User>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
