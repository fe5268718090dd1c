//! Bearer token authentication middleware.

use axum::{
    Extension,
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::application::services::auth_service::require_role;
use crate::domain::entities::{Role, User};
use crate::{error::AppError, state::AppState};

/// The authenticated user, inserted into request extensions by [`layer`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Fails with `403 Forbidden` unless the user holds at least `role`.
    pub fn require(&self, role: Role) -> Result<&User, AppError> {
        require_role(&self.0, role)?;
        Ok(&self.0)
    }
}

/// Extractor alias used by handlers behind [`layer`].
pub type Authenticated = Extension<CurrentUser>;

/// Authenticates requests using Bearer tokens from Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Authentication Flow
///
/// 1. Extract token from `Authorization` header
/// 2. Look up the token digest and check expiry and revocation
/// 3. Update `last_used_at` timestamp
/// 4. Store the owner as [`CurrentUser`] and continue
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - Authorization header is missing
/// - Token format is invalid
/// - Token is unknown, expired or revoked
///
/// Adds `WWW-Authenticate: Bearer` header to 401 responses per RFC 6750.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "No autorizado",
                serde_json::json!({"reason": "Falta el encabezado Authorization o es inválido"}),
            )
        })?;

    let user = st.auth_service.authenticate(&token).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
