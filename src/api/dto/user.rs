//! DTOs for user administration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::user_service::{UserInput, UserUpdateInput};
use crate::domain::entities::User;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl From<CreateUserRequest> for UserInput {
    fn from(r: CreateUserRequest) -> Self {
        UserInput {
            username: r.username,
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
            role: r.role,
            is_staff: r.is_staff,
            is_superuser: r.is_superuser,
        }
    }
}

/// Body of `PUT /api/users/{id}`: a full replacement of the editable fields.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl From<UpdateUserRequest> for UserUpdateInput {
    fn from(r: UpdateUserRequest) -> Self {
        UserUpdateInput {
            username: r.username,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            role: r.role,
            is_staff: r.is_staff,
            is_superuser: r.is_superuser,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignStationsRequest {
    #[validate(length(max = 500))]
    pub station_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub total: usize,
    pub items: Vec<User>,
}
