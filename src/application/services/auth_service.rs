//! Authentication service: login, registration and bearer token sessions.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::application::services::activity_service::{attributed, log_activity};
use crate::application::services::user_service::{
    MIN_PASSWORD_LEN, MIN_USERNAME_LEN, validate_email,
};
use crate::domain::entities::{ActivityStatus, ActivityType, NewActivityLog, NewUser, Role, User};
use crate::domain::repositories::{ActivityLogRepository, TokenRepository, UserRepository};
use crate::error::AppError;
use crate::utils::secrets::{generate_token, hash_password, verify_password};

type HmacSha256 = Hmac<Sha256>;

/// Self-registration input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// An issued bearer token together with its owner.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Service for authenticating users and managing their session tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService<U, T, A>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    users: Arc<U>,
    tokens: Arc<T>,
    activity: Arc<A>,
    signing_secret: String,
    token_ttl: Duration,
}

impl<U, T, A> AuthService<U, T, A>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
    A: ActivityLogRepository + ?Sized,
{
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `signing_secret` - HMAC key; must match the value used when tokens were created
    /// - `token_ttl` - lifetime of issued tokens
    pub fn new(
        users: Arc<U>,
        tokens: Arc<T>,
        activity: Arc<A>,
        signing_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            activity,
            signing_secret,
            token_ttl,
        }
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn issue_session(&self, user: User) -> Result<Session, AppError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;
        self.tokens
            .create_token(user.id, &self.hash_token(&token), expires_at)
            .await?;

        Ok(Session {
            user,
            token,
            expires_at,
        })
    }

    /// Checks credentials and issues a new token.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for missing or too short credentials
    /// - [`AppError::Unauthorized`] for unknown users or wrong passwords
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::bad_request(
                "Usuario y contraseña son requeridos",
                json!({}),
            ));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::bad_request(
                "El usuario debe tener al menos 3 caracteres",
                json!({ "field": "username" }),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(
                "La contraseña debe tener al menos 6 caracteres",
                json!({ "field": "password" }),
            ));
        }

        let invalid = || AppError::unauthorized("Credenciales inválidas", json!({}));

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(invalid)?;
        let stored = self
            .users
            .find_password_hash(user.id)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &stored) {
            tracing::warn!(username, "Failed login attempt");
            let entry = NewActivityLog::new(
                ActivityType::UserLogin,
                "Inicio de sesión fallido",
                format!("Contraseña incorrecta para {username}"),
            )
            .with_status(ActivityStatus::Error);
            log_activity(self.activity.as_ref(), entry).await;
            return Err(invalid());
        }

        let session = self.issue_session(user).await?;

        tracing::info!(user_id = session.user.id, "User logged in");
        let entry = NewActivityLog::new(
            ActivityType::UserLogin,
            "Inicio de sesión",
            format!("{} inició sesión", session.user.username),
        )
        .with_status(ActivityStatus::Info);
        log_activity(self.activity.as_ref(), attributed(entry, Some(&session.user))).await;

        Ok(session)
    }

    /// Creates an `Observador` account and logs it in.
    pub async fn register(&self, input: RegisterInput) -> Result<Session, AppError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        if username.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(AppError::bad_request(
                "Usuario, email y contraseña son requeridos",
                json!({}),
            ));
        }
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::bad_request(
                "Nombre y apellido son requeridos",
                json!({}),
            ));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::bad_request(
                "El usuario debe tener al menos 3 caracteres",
                json!({ "field": "username" }),
            ));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(
                "La contraseña debe tener al menos 6 caracteres",
                json!({ "field": "password" }),
            ));
        }
        if validate_email(&email).is_err() {
            return Err(AppError::bad_request(
                "El formato del email no es válido",
                json!({ "field": "email" }),
            ));
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(
                "El nombre de usuario ya existe",
                json!({ "username": username }),
            ));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(
                "El email ya está registrado",
                json!({ "email": email }),
            ));
        }

        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash: hash_password(&input.password),
                first_name: Some(first_name),
                last_name: Some(last_name),
                role: Role::Observador,
                is_staff: false,
                is_superuser: false,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");

        self.issue_session(user).await
    }

    /// Revokes a token. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(token);
        let user_id = self
            .tokens
            .find_by_hash(&token_hash)
            .await?
            .map(|t| t.user_id);

        if self.tokens.revoke(&token_hash).await?
            && let Some(user_id) = user_id
            && let Some(user) = self.users.find_by_id(user_id).await?
        {
            let entry = NewActivityLog::new(
                ActivityType::UserLogout,
                "Cierre de sesión",
                format!("{} cerró sesión", user.username),
            )
            .with_status(ActivityStatus::Info);
            log_activity(self.activity.as_ref(), attributed(entry, Some(&user))).await;
        }

        Ok(())
    }

    /// Returns the token owner, or `None` for empty, unknown, expired or
    /// revoked tokens.
    pub async fn validate_token(&self, token: &str) -> Result<Option<User>, AppError> {
        if token.trim().is_empty() {
            return Ok(None);
        }

        let token_hash = self.hash_token(token);
        let Some(stored) = self.tokens.find_by_hash(&token_hash).await? else {
            return Ok(None);
        };
        if !stored.is_usable() {
            return Ok(None);
        }

        self.users.find_by_id(stored.user_id).await
    }

    /// Authenticates a raw bearer token.
    ///
    /// On success, updates the `last_used` timestamp of the token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown, expired or revoked.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let user = self.validate_token(token).await?.ok_or_else(|| {
            AppError::unauthorized(
                "No autorizado",
                json!({ "reason": "Token inválido, expirado o revocado" }),
            )
        })?;

        if let Err(e) = self.tokens.update_last_used(&self.hash_token(token)).await {
            tracing::debug!(error = %e, "Failed to update token last_used");
        }

        Ok(user)
    }

    /// Revokes the given token and issues a fresh one for the same user.
    pub async fn refresh_token(&self, token: &str) -> Result<Session, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::bad_request("Token es requerido", json!({})));
        }

        let user = self.authenticate(token).await?;
        self.tokens.revoke(&self.hash_token(token)).await?;

        self.issue_session(user).await
    }
}

/// Fails with [`AppError::Forbidden`] unless `user` holds at least `required`.
pub fn require_role(user: &User, required: Role) -> Result<(), AppError> {
    if user.role.satisfies(required) {
        return Ok(());
    }
    Err(AppError::forbidden(
        "No tiene permisos para realizar esta acción",
        json!({ "required_role": required, "role": user.role }),
    ))
}
