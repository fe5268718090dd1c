//! User entity and role model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access role. Ordered by privilege: `Observador < Tecnico < Administrador`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Observador")]
    Observador,
    #[serde(rename = "Técnico")]
    Tecnico,
    #[serde(rename = "Administrador")]
    Administrador,
}

/// Lowercases and strips Spanish diacritics.
fn sanitize(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

impl Role {
    pub const ALL: [Role; 3] = [Self::Administrador, Self::Tecnico, Self::Observador];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrador => "Administrador",
            Self::Tecnico => "Técnico",
            Self::Observador => "Observador",
        }
    }

    /// Numeric rank used for privilege comparisons.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Administrador => 3,
            Self::Tecnico => 2,
            Self::Observador => 1,
        }
    }

    /// Parses a canonical role name or a known alias, ignoring case and accents.
    pub fn parse(value: &str) -> Option<Self> {
        match sanitize(value).as_str() {
            "administrador" | "admin" | "administrator" | "administrador del sistema" => {
                Some(Self::Administrador)
            }
            "tecnico" | "technician" | "technic" | "tecnico principal" => Some(Self::Tecnico),
            "observador" | "observer" | "viewer" => Some(Self::Observador),
            _ => None,
        }
    }

    /// Lenient normalization for role strings coming from clients.
    ///
    /// Empty or unknown roles fall back to [`Role::Observador`].
    pub fn normalize(value: &str) -> Self {
        if value.trim().is_empty() {
            return Self::Observador;
        }

        Self::parse(value).unwrap_or_else(|| {
            tracing::warn!(role = value, "Unknown role received, defaulting to Observador");
            Self::Observador
        })
    }

    /// Returns true if this role grants at least the privileges of `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub assigned_stations: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Input data for creating a user. `password_hash` is already derived.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Full replacement of the editable user fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_staff: bool,
    pub is_superuser: bool,
}
