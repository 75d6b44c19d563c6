//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database, plus the validated DTOs used to create and update it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use validator::Validate;

use crate::utils::jwt::Principal;
use crate::utils::rut::validate_rut_field;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// Normalized RUT (uppercase, no separators)
    pub rut: String,
    pub is_active: bool,
    pub subscription_plan: Option<String>,
    pub settings: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTenant {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Tenant name must be between 1-255 characters"
    ))]
    pub name: String,

    #[validate(custom(function = "validate_rut_field"))]
    pub rut: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[validate(length(max = 100, message = "Subscription plan too long"))]
    pub subscription_plan: Option<String>,

    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTenant {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Tenant name must be between 1-255 characters"
    ))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_rut_field"))]
    pub rut: Option<String>,

    pub is_active: Option<bool>,

    #[validate(length(max = 100, message = "Subscription plan too long"))]
    pub subscription_plan: Option<String>,

    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub tenant_id: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superadmin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            id: user.id.clone(),
            email: user.email.clone(),
            is_superadmin: user.is_superadmin,
            is_active: user.is_active,
        }
    }
}

/// User creation payload used by superadmins.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    pub tenant_id: Option<String>,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1-255 characters"
    ))]
    pub first_name: String,

    #[validate(length(max = 255, message = "Last name too long"))]
    pub last_name: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_superadmin: bool,
}

/// Self-service registration payload. Cannot grant superadmin or join a
/// tenant; tenant membership is assigned by a superadmin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1-255 characters"
    ))]
    pub first_name: String,

    #[validate(length(max = 255, message = "Last name too long"))]
    pub last_name: Option<String>,
}

impl From<SignupRequest> for CreateUser {
    fn from(request: SignupRequest) -> Self {
        CreateUser {
            tenant_id: None,
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            is_active: true,
            is_superadmin: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    pub tenant_id: Option<String>,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1-255 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name too long"))]
    pub last_name: Option<String>,

    pub is_active: Option<bool>,

    pub is_superadmin: Option<bool>,
}

/// Profile changes a user may make to their own account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCurrentUser {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1-255 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name too long"))]
    pub last_name: Option<String>,
}

impl From<UpdateCurrentUser> for UpdateUser {
    fn from(update: UpdateCurrentUser) -> Self {
        UpdateUser {
            email: update.email,
            password: update.password,
            first_name: update.first_name,
            last_name: update.last_name,
            ..UpdateUser::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
