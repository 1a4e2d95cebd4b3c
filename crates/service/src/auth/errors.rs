use thiserror::Error;

use crate::errors::ServiceError;
use crate::storage::StoreError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("account is deactivated")]
    Inactive,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict(_) => 1002,
            AuthError::Inactive => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Store(_) => 1200,
        }
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(m) => AuthError::Validation(m),
            models::errors::ModelError::Db(m) => AuthError::Store(StoreError::db("users", m)),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) | AuthError::Conflict(m) => ServiceError::Validation(m),
            AuthError::Unauthorized => ServiceError::Unauthenticated("invalid credentials".into()),
            AuthError::TokenError(_) => ServiceError::Unauthenticated("invalid or expired session".into()),
            AuthError::Inactive => ServiceError::Forbidden("account is deactivated".into()),
            AuthError::HashError(m) => ServiceError::Storage(m),
            AuthError::Store(e) => ServiceError::Store(e),
        }
    }
}
