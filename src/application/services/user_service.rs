//! User account management.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::json;

use crate::application::services::activity_service::{attributed, log_activity};
use crate::domain::entities::{
    ActivityType, NewActivityLog, NewUser, Role, UpdateUser, User,
};
use crate::domain::repositories::{ActivityLogRepository, StationRepository, UserRepository};
use crate::error::AppError;
use crate::utils::secrets::hash_password;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Raw account input as received from clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Raw account update. The role is left unchanged when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdateInput {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

pub(crate) fn validate_username(username: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request(
            "El nombre de usuario es requerido",
            json!({ "field": "username" }),
        ));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::bad_request(
            "El nombre de usuario debe tener al menos 3 caracteres",
            json!({ "field": "username" }),
        ));
    }
    Ok(username.to_string())
}

pub(crate) fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::bad_request(
            "El email es requerido",
            json!({ "field": "email" }),
        ));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::bad_request(
            "Formato de email inválido",
            json!({ "field": "email" }),
        ));
    }
    Ok(email.to_lowercase())
}

pub(crate) fn validate_password(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::bad_request(
            "La contraseña es requerida",
            json!({ "field": "password" }),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "La contraseña debe tener al menos 6 caracteres",
            json!({ "field": "password" }),
        ));
    }
    Ok(())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(
            "ID de usuario inválido",
            json!({ "id": id }),
        ));
    }
    Ok(())
}

fn user_not_found(id: i64) -> AppError {
    AppError::not_found("Usuario no encontrado", json!({ "id": id }))
}

pub struct UserService<U, S, A>
where
    U: UserRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    users: Arc<U>,
    stations: Arc<S>,
    activity: Arc<A>,
}

impl<U, S, A> UserService<U, S, A>
where
    U: UserRepository + ?Sized,
    S: StationRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    pub fn new(users: Arc<U>, stations: Arc<S>, activity: Arc<A>) -> Self {
        Self {
            users,
            stations,
            activity,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.users.find_all().await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        validate_id(id)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for missing fields, bad email or short password
    /// - [`AppError::Conflict`] when the username or email is taken
    pub async fn create_user(
        &self,
        input: UserInput,
        actor: Option<&User>,
    ) -> Result<User, AppError> {
        let username = validate_username(&input.username)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;

        self.ensure_unique(&username, &email, None).await?;

        let role = input
            .role
            .as_deref()
            .map(Role::normalize)
            .unwrap_or(Role::Observador);

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash: hash_password(&input.password),
                first_name: clean_optional(input.first_name),
                last_name: clean_optional(input.last_name),
                role,
                is_staff: input.is_staff,
                is_superuser: input.is_superuser,
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User created");

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Usuario creado",
            format!("Se creó el usuario {} con rol {}", user.username, user.role),
        );
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(user)
    }

    pub async fn update_user(
        &self,
        id: i64,
        input: UserUpdateInput,
        actor: Option<&User>,
    ) -> Result<User, AppError> {
        validate_id(id)?;
        let username = validate_username(&input.username)?;
        let email = validate_email(&input.email)?;

        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        self.ensure_unique(&username, &email, Some(id)).await?;

        let user = self
            .users
            .update(
                id,
                UpdateUser {
                    username,
                    email,
                    first_name: clean_optional(input.first_name),
                    last_name: clean_optional(input.last_name),
                    role: input.role.as_deref().map(Role::normalize),
                    is_staff: input.is_staff,
                    is_superuser: input.is_superuser,
                },
            )
            .await?
            .ok_or_else(|| user_not_found(id))?;

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Usuario actualizado",
            format!("Se actualizó el usuario {}", user.username),
        );
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(user)
    }

    /// Deletes an account. Users cannot delete themselves.
    pub async fn delete_user(&self, id: i64, actor: Option<&User>) -> Result<(), AppError> {
        validate_id(id)?;

        if actor.is_some_and(|a| a.id == id) {
            return Err(AppError::business_rule(
                "No puede eliminar su propio usuario",
                json!({ "id": id }),
            ));
        }

        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        if !self.users.delete(id).await? {
            return Err(user_not_found(id));
        }

        tracing::info!(user_id = id, "User deleted");

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Usuario eliminado",
            format!("Se eliminó el usuario {}", user.username),
        );
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(())
    }

    /// Replaces the stations assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when any station does not exist.
    pub async fn assign_stations(
        &self,
        id: i64,
        mut station_ids: Vec<i64>,
        actor: Option<&User>,
    ) -> Result<User, AppError> {
        validate_id(id)?;

        station_ids.sort_unstable();
        station_ids.dedup();

        let mut missing = Vec::new();
        for station_id in &station_ids {
            if *station_id <= 0 || self.stations.find_by_id(*station_id).await?.is_none() {
                missing.push(*station_id);
            }
        }
        if !missing.is_empty() {
            return Err(AppError::bad_request(
                "Una o más estaciones no existen",
                json!({ "missing": missing }),
            ));
        }

        let user = self
            .users
            .set_assigned_stations(id, station_ids)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        let entry = NewActivityLog::new(
            ActivityType::ConfigurationChanged,
            "Estaciones asignadas",
            format!(
                "Se asignaron {} estaciones al usuario {}",
                user.assigned_stations.len(),
                user.username
            ),
        )
        .with_metadata(json!({ "assigned_stations": user.assigned_stations }));
        log_activity(self.activity.as_ref(), attributed(entry, actor)).await;

        Ok(user)
    }

    /// Fails with [`AppError::Conflict`] if another account uses the username or email.
    pub(crate) async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(other) = self.users.find_by_username(username).await?
            && Some(other.id) != except
        {
            return Err(AppError::conflict(
                "El nombre de usuario ya existe",
                json!({ "username": username }),
            ));
        }
        if let Some(other) = self.users.find_by_email(email).await?
            && Some(other.id) != except
        {
            return Err(AppError::conflict(
                "El email ya está registrado",
                json!({ "email": email }),
            ));
        }
        Ok(())
    }
}
