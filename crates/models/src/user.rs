use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Registered account. `password_hash` is an argon2 PHC string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub uploads_count: u64,
    #[serde(default)]
    pub downloads_count: u64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool { true }

/// Public view of a user (no credentials).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub join_date: DateTime<Utc>,
    pub uploads_count: u64,
    pub downloads_count: u64,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            email: u.email.clone(),
            join_date: u.join_date,
            uploads_count: u.uploads_count,
            downloads_count: u.downloads_count,
            is_admin: u.is_admin,
            is_active: u.is_active,
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

pub fn validate_username(name: &str) -> Result<(), ModelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::Validation("username required".into()));
    }
    if name.len() > 64 {
        return Err(ModelError::Validation("username too long (<=64)".into()));
    }
    Ok(())
}
