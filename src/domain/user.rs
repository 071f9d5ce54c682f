//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{MAX_USERNAME_LENGTH, ROLE_ADMIN, ROLE_DOCTOR};
use crate::errors::{AppError, AppResult};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Doctor
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::Doctor,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::Doctor => write!(f, "{}", ROLE_DOCTOR),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(id: String, username: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            password_hash,
            role: UserRole::default(),
            created_at: Utc::now(),
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Check that a username is usable as an identity and inside cache keys.
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    if username.chars().count() as u64 > MAX_USERNAME_LENGTH {
        return Err(AppError::validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if username.contains(':') {
        return Err(AppError::validation("Username must not contain ':'"));
    }
    Ok(())
}

/// User response DTO (excludes sensitive fields)
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "dr_house")]
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
