//! Account records shared by the workflows and the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Protocol tag stored on passports created by this service.
pub const LOCAL_PROTOCOL: &str = "local";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub government_uri: Option<String>,
    pub is_admin: bool,
    pub is_agency_admin: bool,
    pub disabled: bool,
    pub password_attempts: i32,
    pub completed_tasks: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes accepted by the registration workflow.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
    pub government_uri: Option<String>,
    pub tags: Vec<i64>,
}

/// User row to insert, with the default flags for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub name: Option<String>,
    pub government_uri: Option<String>,
    pub is_admin: bool,
    pub is_agency_admin: bool,
    pub disabled: bool,
    pub password_attempts: i32,
    pub completed_tasks: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    #[must_use]
    pub fn from_registration(registration: &Registration, now: DateTime<Utc>) -> Self {
        Self {
            username: registration.username.clone(),
            name: registration.name.clone(),
            government_uri: registration.government_uri.clone(),
            is_admin: false,
            is_agency_admin: false,
            disabled: false,
            password_attempts: 0,
            completed_tasks: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passport {
    pub id: i64,
    pub user_id: i64,
    pub protocol: String,
    pub password: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Passport values to write; `id` is set when an existing row is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassport {
    pub id: Option<i64>,
    pub user_id: i64,
    pub protocol: String,
    pub password: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewPassport {
    #[must_use]
    pub fn local(user_id: i64, password: String, access_token: String, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            protocol: LOCAL_PROTOCOL.to_string(),
            password,
            access_token,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A fresh, unexpired reset token joined with its owner's username.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CheckedToken {
    #[serde(flatten)]
    pub reset: PasswordReset,
    pub email: String,
}

/// Partial user update issued by the reset workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAttemptsUpdate {
    pub id: i64,
    pub password_attempts: i32,
}
