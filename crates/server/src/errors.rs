use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::{access::Rejection, auth::errors::AuthError, errors::ServiceError};
use thiserror::Error;
use tracing::{error, warn};

/// Handler error rendered as `{"error": message}` with a status derived from
/// the service error kind.
#[derive(Debug)]
pub struct JsonApiError(pub ServiceError);

impl JsonApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ServiceError::Validation(msg.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Store(_) | ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self { Self(e) }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self { Self(e.into()) }
}

impl From<Rejection> for JsonApiError {
    fn from(r: Rejection) -> Self { Self(r.into()) }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "internal server error".to_string()
        } else {
            warn!(status = status.as_u16(), error = %self.0, "request rejected");
            self.0.to_string()
        };
        (status, Json(ErrorBody::new(msg))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
