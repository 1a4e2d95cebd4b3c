//! Request gating: who is calling, and may they touch this record.

use models::user::User;
use tracing::debug;

use crate::auth::AuthService;
use crate::errors::ServiceError;

/// Authenticated caller, resolved from the current user record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for Identity {
    fn from(u: &User) -> Self {
        Self { user_id: u.id.clone(), username: u.username.clone(), is_admin: u.is_admin }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingSession,
    InvalidSession,
    UnknownUser,
    Inactive,
    NotAdmin,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MissingSession => "login required",
            Rejection::InvalidSession => "invalid or expired session",
            Rejection::UnknownUser => "account no longer exists",
            Rejection::Inactive => "account is deactivated",
            Rejection::NotAdmin => "admin access required",
        }
    }

    /// 403 rather than 401: the caller is known but not allowed.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Rejection::Inactive | Rejection::NotAdmin)
    }
}

impl From<Rejection> for ServiceError {
    fn from(r: Rejection) -> Self {
        if r.is_forbidden() {
            ServiceError::Forbidden(r.message().into())
        } else {
            ServiceError::Unauthenticated(r.message().into())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Authorized(Identity),
    Rejected(Rejection),
}

impl Gate {
    /// Narrow an authorized gate to administrators.
    pub fn require_admin(self) -> Gate {
        match self {
            Gate::Authorized(id) if !id.is_admin => Gate::Rejected(Rejection::NotAdmin),
            other => other,
        }
    }

    pub fn into_result(self) -> Result<Identity, ServiceError> {
        match self {
            Gate::Authorized(id) => Ok(id),
            Gate::Rejected(r) => Err(r.into()),
        }
    }
}

/// Resolve a session token to a gate decision. Only storage failures are
/// errors; every reason to turn the caller away is a `Rejected` gate.
pub async fn session_gate(auth: &AuthService, token: Option<&str>) -> Result<Gate, ServiceError> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(Gate::Rejected(Rejection::MissingSession));
    };
    let claims = match auth.verify_token(token) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "session token rejected");
            return Ok(Gate::Rejected(Rejection::InvalidSession));
        }
    };
    let user = match auth.find_user(&claims.uid).await {
        Ok(Some(u)) => u,
        Ok(None) => return Ok(Gate::Rejected(Rejection::UnknownUser)),
        Err(e) => return Err(e.into()),
    };
    if !user.is_active {
        return Ok(Gate::Rejected(Rejection::Inactive));
    }
    Ok(Gate::Authorized(Identity::from(&user)))
}

/// Owner-or-admin check for mutating a record.
pub fn ensure_owner_or_admin(identity: &Identity, owner_id: &str) -> Result<(), ServiceError> {
    if identity.is_admin || identity.user_id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::forbidden())
    }
}
