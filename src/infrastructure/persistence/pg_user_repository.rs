//! PostgreSQL implementation of user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewUser, Role, UpdateUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Users joined with their station assignments.
const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.role,
           u.is_staff, u.is_superuser, u.created_at, u.updated_at,
           COALESCE(
               ARRAY(SELECT us.station_id FROM user_stations us
                     WHERE us.user_id = u.id ORDER BY us.station_id),
               '{}'
           ) AS assigned_stations
    FROM users u
"#;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_stations: Vec<i64>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: Role::normalize(&row.role),
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            assigned_stations: row.assigned_stations,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL repository for user accounts.
///
/// Password hashes are only exposed through `find_password_hash`.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} {clause}"))
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY u.id"))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where("WHERE u.username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where("WHERE LOWER(u.email) = LOWER($1)", email)
            .await
    }

    async fn find_password_hash(&self, user_id: i64) -> Result<Option<String>, AppError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(hash)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users
                (username, email, password_hash, first_name, last_name, role, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(self.pool.as_ref())
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::internal("Usuario no creado", serde_json::json!({ "id": id }))
        })
    }

    async fn update(&self, id: i64, user: UpdateUser) -> Result<Option<User>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                first_name = $4,
                last_name = $5,
                role = COALESCE($6, role),
                is_staff = $7,
                is_superuser = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(user.username)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role.map(|r| r.as_str()))
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .execute(self.pool.as_ref())
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn set_assigned_stations(
        &self,
        id: i64,
        station_ids: Vec<i64>,
    ) -> Result<Option<User>, AppError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM user_stations WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_stations (user_id, station_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&station_ids[..])
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
