use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use super::Table;
use crate::domain::entities::{NewUser, UpdateUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// A user row together with its password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

pub struct MemoryUserRepository {
    table: RwLock<Table<StoredUser>>,
}

impl MemoryUserRepository {
    pub fn new(users: Vec<StoredUser>) -> Self {
        Self {
            table: RwLock::new(Table::new(users, |u| u.user.id)),
        }
    }
}

fn identity_taken(
    table: &Table<StoredUser>,
    username: &str,
    email: &str,
    except: Option<i64>,
) -> Result<(), AppError> {
    let others = || table.rows.iter().filter(|row| Some(row.user.id) != except);
    if others().any(|row| row.user.username == username) {
        return Err(AppError::conflict(
            "El nombre de usuario ya existe",
            json!({ "username": username }),
        ));
    }
    if others().any(|row| row.user.email.eq_ignore_ascii_case(email)) {
        return Err(AppError::conflict(
            "El email ya está registrado",
            json!({ "email": email }),
        ));
    }
    Ok(())
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .map(|row| row.user.clone())
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.user.id == id)
            .map(|row| row.user.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.user.username == username)
            .map(|row| row.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.user.email.eq_ignore_ascii_case(email))
            .map(|row| row.user.clone()))
    }

    async fn find_password_hash(&self, user_id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.user.id == user_id)
            .map(|row| row.password_hash.clone()))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut table = self.table.write().await;
        identity_taken(&table, &user.username, &user.email, None)?;
        let now = Utc::now();
        let created = User {
            id: table.allocate_id(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            assigned_stations: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        table.rows.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn update(&self, id: i64, update: UpdateUser) -> Result<Option<User>, AppError> {
        let mut table = self.table.write().await;
        identity_taken(&table, &update.username, &update.email, Some(id))?;
        let Some(row) = table.rows.iter_mut().find(|row| row.user.id == id) else {
            return Ok(None);
        };
        let user = &mut row.user;
        user.username = update.username;
        user.email = update.email;
        user.first_name = update.first_name;
        user.last_name = update.last_name;
        if let Some(role) = update.role {
            user.role = role;
        }
        user.is_staff = update.is_staff;
        user.is_superuser = update.is_superuser;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_assigned_stations(
        &self,
        id: i64,
        station_ids: Vec<i64>,
    ) -> Result<Option<User>, AppError> {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.iter_mut().find(|row| row.user.id == id) else {
            return Ok(None);
        };
        row.user.assigned_stations = station_ids;
        row.user.updated_at = Utc::now();
        Ok(Some(row.user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|row| row.user.id != id);
        Ok(table.rows.len() != before)
    }
}
