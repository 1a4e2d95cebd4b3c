//! Session middleware: turns the `auth_token` cookie into an [`Identity`]
//! request extension, or a 401/403 JSON response.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::access::{session_gate, Gate};
use tracing::debug;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "auth_token";

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    jar.remove(cookie)
}

async fn gate(state: &AppState, jar: &CookieJar) -> Result<Gate, JsonApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    Ok(session_gate(&state.auth, token.as_deref()).await?)
}

fn admit(gate: Gate, mut req: Request) -> Result<Request, JsonApiError> {
    match gate {
        Gate::Authorized(identity) => {
            req.extensions_mut().insert(identity);
            Ok(req)
        }
        Gate::Rejected(reason) => {
            debug!(path = %req.uri().path(), ?reason, "request gated");
            Err(reason.into())
        }
    }
}

/// Any active, logged-in user.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let gate = gate(&state, &jar).await?;
    Ok(next.run(admit(gate, req)?).await)
}

/// Active user whose current record carries the admin flag.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let gate = gate(&state, &jar).await?.require_admin();
    Ok(next.run(admit(gate, req)?).await)
}
